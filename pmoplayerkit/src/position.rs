//! Logical position inside a playlist queue and the traversal rules that
//! move it.
//!
//! Traversal only ever lands on a track accepted by the `is_playable`
//! predicate. When the current playlist has no further candidate in the
//! requested direction, the search continues in the adjacent playlists,
//! skipping any that hold no playable track.

use std::fmt;

use crate::model::{Playlist, PlaylistRef, TrackRef};

/// `(playlist index, track index)` within a queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub playlist_index: usize,
    pub track_index: usize,
}

impl Position {
    pub fn new(playlist_index: usize, track_index: usize) -> Self {
        Self {
            playlist_index,
            track_index,
        }
    }

    pub fn playlist<'a>(&self, playlists: &'a [PlaylistRef]) -> Option<&'a PlaylistRef> {
        playlists.get(self.playlist_index)
    }

    pub fn track(&self, playlists: &[PlaylistRef]) -> Option<TrackRef> {
        self.playlist(playlists)?.track(self.track_index)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.playlist_index, self.track_index)
    }
}

/// Nearest playable position after `from`, or `None` when the rest of the
/// queue holds nothing playable.
pub fn next_position<F>(playlists: &[PlaylistRef], from: Position, is_playable: F) -> Option<Position>
where
    F: Fn(&TrackRef) -> bool,
{
    if let Some(playlist) = playlists.get(from.playlist_index) {
        let tracks = playlist.tracks();
        if let Some(offset) = tracks
            .iter()
            .skip(from.track_index + 1)
            .position(|t| is_playable(t))
        {
            return Some(Position::new(
                from.playlist_index,
                from.track_index + 1 + offset,
            ));
        }
    }

    for playlist_index in (from.playlist_index + 1)..playlists.len() {
        let tracks = playlists[playlist_index].tracks();
        if let Some(track_index) = tracks.iter().position(|t| is_playable(t)) {
            return Some(Position::new(playlist_index, track_index));
        }
    }
    None
}

/// Nearest playable position before `from`. Crossing into an earlier
/// playlist lands on its last playable track.
pub fn previous_position<F>(
    playlists: &[PlaylistRef],
    from: Position,
    is_playable: F,
) -> Option<Position>
where
    F: Fn(&TrackRef) -> bool,
{
    if let Some(playlist) = playlists.get(from.playlist_index) {
        let tracks = playlist.tracks();
        let end = from.track_index.min(tracks.len());
        if let Some(track_index) = tracks[..end].iter().rposition(|t| is_playable(t)) {
            return Some(Position::new(from.playlist_index, track_index));
        }
    }

    for playlist_index in (0..from.playlist_index.min(playlists.len())).rev() {
        let tracks = playlists[playlist_index].tracks();
        if let Some(track_index) = tracks.iter().rposition(|t| is_playable(t)) {
            return Some(Position::new(playlist_index, track_index));
        }
    }
    None
}
