use std::ops::Index;

use crate::model::{PlayerType, Playlist, PlaylistRef, Track, TrackRef};

/// Contiguous run of same-backend tracks handed to one backend player.
///
/// Two lists are equal when their ids are equal, whatever they contain.
#[derive(Clone, Debug)]
pub struct TrackList {
    pub id: String,
    pub tracks: Vec<TrackRef>,
}

impl TrackList {
    pub fn new(id: &str, tracks: Vec<TrackRef>) -> Self {
        Self {
            id: id.to_string(),
            tracks,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TrackRef> {
        self.tracks.get(index)
    }

    pub fn player_type(&self) -> Option<PlayerType> {
        self.tracks.first().map(|t| t.player_type())
    }

    /// Builds the run of tracks sharing the backend of `playlist[index]`.
    ///
    /// The id is `<playlist id>:<backend>:<first index of the run>`, so the
    /// same run always yields the same id. Returns `None` when `index` is out
    /// of range.
    pub fn same_backend_run(playlist: &PlaylistRef, index: usize) -> Option<Self> {
        let tracks = playlist.tracks();
        let player_type = tracks.get(index)?.player_type();

        let start = tracks[..index]
            .iter()
            .rposition(|t| t.player_type() != player_type)
            .map_or(0, |i| i + 1);
        let end = tracks[index..]
            .iter()
            .position(|t| t.player_type() != player_type)
            .map_or(tracks.len(), |i| index + i);

        Some(Self {
            id: format!("{}:{}:{}", playlist.id(), player_type, start),
            tracks: tracks[start..end].to_vec(),
        })
    }
}

impl PartialEq for TrackList {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TrackList {}

impl Index<usize> for TrackList {
    type Output = TrackRef;

    fn index(&self, index: usize) -> &TrackRef {
        &self.tracks[index]
    }
}
