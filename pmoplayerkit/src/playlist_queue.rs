//! Ordered playlists being traversed by a queue player.

use std::fmt;
use std::sync::{Arc, Mutex, RwLock, Weak};

use tracing::debug;

use crate::model::{Playlist, PlaylistRef, Track, TrackRef};
use crate::queue_player::{QueuePlayer, QueuePlayerShared};

/// Playlists in play order, plus a non-owning link to the queue player that
/// currently traverses them.
///
/// Equality compares the sequence of playlist ids.
pub struct PlaylistQueue {
    playlists: RwLock<Vec<PlaylistRef>>,
    player: Mutex<Weak<QueuePlayerShared>>,
}

impl PlaylistQueue {
    pub fn new(playlists: Vec<PlaylistRef>) -> Self {
        Self {
            playlists: RwLock::new(playlists),
            player: Mutex::new(Weak::new()),
        }
    }

    pub fn shared(playlists: Vec<PlaylistRef>) -> Arc<Self> {
        Arc::new(Self::new(playlists))
    }

    /// Appends `playlist` unless it holds no track at all.
    pub fn enqueue(&self, playlist: PlaylistRef) {
        if playlist.is_empty() {
            debug!(playlist = playlist.id(), "Ignoring empty playlist");
            return;
        }
        self.playlists
            .write()
            .expect("Playlist queue lock poisoned")
            .push(playlist);
    }

    pub fn index_of(&self, playlist: &PlaylistRef) -> Option<usize> {
        self.playlists
            .read()
            .expect("Playlist queue lock poisoned")
            .iter()
            .position(|p| p.id() == playlist.id())
    }

    pub fn playlists(&self) -> Vec<PlaylistRef> {
        self.playlists
            .read()
            .expect("Playlist queue lock poisoned")
            .clone()
    }

    pub fn playlist(&self, index: usize) -> Option<PlaylistRef> {
        self.playlists
            .read()
            .expect("Playlist queue lock poisoned")
            .get(index)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.playlists
            .read()
            .expect("Playlist queue lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<String> {
        self.playlists
            .read()
            .expect("Playlist queue lock poisoned")
            .iter()
            .map(|p| p.id().to_string())
            .collect()
    }

    /// The queue player currently traversing this queue, if it is alive.
    pub fn player(&self) -> Option<QueuePlayer> {
        self.player
            .lock()
            .expect("Playlist queue player mutex poisoned")
            .upgrade()
            .map(QueuePlayer::from_shared)
    }

    pub(crate) fn set_player(&self, player: Weak<QueuePlayerShared>) {
        *self
            .player
            .lock()
            .expect("Playlist queue player mutex poisoned") = player;
    }

    /// Drops the link only if it still points at `player`.
    pub(crate) fn release_player(&self, player: &Weak<QueuePlayerShared>) {
        let mut current = self
            .player
            .lock()
            .expect("Playlist queue player mutex poisoned");
        if Weak::ptr_eq(&current, player) {
            *current = Weak::new();
        }
    }

    /// Tells the owning player that `track` got its locator after the queue
    /// was built. When it is the track the player would advance to next,
    /// the player announces `NextTrackAdded`.
    pub fn track_updated(&self, track: &TrackRef) {
        let Some(player) = self.player() else {
            return;
        };
        match player.playlist_queue() {
            Some(queue) if *queue == *self => {}
            _ => return,
        }
        let Some(next) = player.next_track() else {
            return;
        };
        let locator = track.locator();
        if locator.is_some() && next.locator() == locator {
            player.next_track_added();
        }
    }
}

impl PartialEq for PlaylistQueue {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.ids() == other.ids()
    }
}

impl fmt::Debug for PlaylistQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaylistQueue")
            .field("playlists", &self.ids())
            .finish()
    }
}
