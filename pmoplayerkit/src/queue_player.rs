//! Multi-backend queue player.
//!
//! `QueuePlayer` owns the current [`PlaylistQueue`], the current
//! [`Position`] in it and one backend player per [`PlayerType`]. Transport
//! commands go to the backend matching the current track's type, and backend
//! events come back as a single [`QueuePlayerEvent`] stream.
//!
//! State lives behind one mutex. Observers are notified only after the lock
//! is released, so an observer may call back into the player (for example to
//! enqueue a playlist and call [`QueuePlayer::next`] on
//! `NextPlaylistRequested`).

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::config::PlayerKitConfig;
use crate::model::{PlayerState, PlayerType, PlayingInfo, Playlist, PlaylistRef, Track, TrackRef};
use crate::observable::{Observable, ObserverList};
use crate::playlist_queue::PlaylistQueue;
use crate::position::{Position, next_position, previous_position};
use crate::service_player::backend::{BackendEvent, BackendRegistry, PlayerEngines};
use crate::service_player::{ServicePlayer, ServicePlayerBackend, ServicePlayerEvent};
use crate::track_list::TrackList;

/// Events published to queue player observers.
#[derive(Clone, Debug)]
pub enum QueuePlayerEvent {
    TimeUpdated,
    DidPlayToEndTime,
    StatusChanged(PlayerState),
    TrackSelected {
        track: TrackRef,
        index: usize,
        playlist: PlaylistRef,
    },
    TrackUnselected {
        track: TrackRef,
        index: usize,
        playlist: PlaylistRef,
    },
    /// Nothing playable before the current track; the application may
    /// prepend content.
    PreviousPlaylistRequested,
    /// Nothing playable after the current track; the application may
    /// enqueue more content.
    NextPlaylistRequested,
    ErrorOccured {
        backend: PlayerType,
        message: String,
    },
    NextTrackAdded,
}

/// Result of resolving a selection request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Selection {
    /// The requested position was already current.
    Unchanged,
    Changed,
    Rejected,
}

type SelectedTrack = (TrackRef, usize, PlaylistRef);

pub(crate) struct QueuePlayerShared {
    core: Mutex<QueuePlayerCore>,
    observers: ObserverList<QueuePlayerEvent>,
}

struct QueuePlayerCore {
    this: Weak<QueuePlayerShared>,
    queue: Option<Arc<PlaylistQueue>>,
    position: Option<Position>,
    /// Backend owning the current track.
    active: Option<PlayerType>,
    backends: BackendRegistry,
    backend_events: Receiver<BackendEvent>,
    /// Events waiting to be delivered once the lock is released.
    outbox: Vec<QueuePlayerEvent>,
}

/// Handle on a queue player. Clones share the same player.
#[derive(Clone)]
pub struct QueuePlayer {
    shared: Arc<QueuePlayerShared>,
}

impl std::fmt::Debug for QueuePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuePlayer")
            .field("position", &self.current_position())
            .field("state", &self.current_state())
            .finish()
    }
}

impl QueuePlayer {
    pub fn new(backends: BackendRegistry) -> Self {
        let backend_events = backends.subscribe();
        let shared = Arc::new_cyclic(|this| QueuePlayerShared {
            core: Mutex::new(QueuePlayerCore {
                this: this.clone(),
                queue: None,
                position: None,
                active: None,
                backends,
                backend_events,
                outbox: Vec::new(),
            }),
            observers: ObserverList::new(),
        });
        Self { shared }
    }

    pub fn with_engines(engines: PlayerEngines, config: &PlayerKitConfig) -> Self {
        Self::new(BackendRegistry::from_engines(engines, config))
    }

    pub(crate) fn from_shared(shared: Arc<QueuePlayerShared>) -> Self {
        Self { shared }
    }

    /// Runs `f` under the lock, folds backend events into the outbox, then
    /// delivers the outbox with the lock released.
    fn with_core<R>(&self, f: impl FnOnce(&mut QueuePlayerCore) -> R) -> R {
        let (result, events) = {
            let mut core = self
                .shared
                .core
                .lock()
                .expect("Queue player mutex poisoned");
            let result = f(&mut core);
            core.dispatch_backend_events();
            (result, std::mem::take(&mut core.outbox))
        };
        for event in &events {
            self.shared.observers.notify(event);
        }
        result
    }

    /// Selects a track without starting playback.
    ///
    /// Returns false, changing nothing, when the playlist is not in `queue`,
    /// the track is invalid, or no backend handles its type.
    pub fn select(&self, track_index: usize, playlist: &PlaylistRef, queue: &Arc<PlaylistQueue>) -> bool {
        self.with_core(|core| core.select(track_index, playlist, queue) != Selection::Rejected)
    }

    /// Selects a track and starts it.
    pub fn play_at(&self, track_index: usize, playlist: &PlaylistRef, queue: &Arc<PlaylistQueue>) -> bool {
        self.with_core(|core| match core.select(track_index, playlist, queue) {
            Selection::Rejected => false,
            // Already current and running: leave playback alone.
            Selection::Unchanged if core.current_state().is_playing() => true,
            _ => {
                core.play();
                true
            }
        })
    }

    /// Toggles the track when it is already current, plays it otherwise.
    pub fn toggle_at(&self, track_index: usize, playlist: &PlaylistRef, queue: &Arc<PlaylistQueue>) -> bool {
        self.with_core(|core| match core.select(track_index, playlist, queue) {
            Selection::Rejected => false,
            Selection::Unchanged => {
                core.toggle();
                true
            }
            Selection::Changed => {
                core.play();
                true
            }
        })
    }

    pub fn play(&self) {
        self.with_core(|core| core.play());
    }

    pub fn pause(&self) {
        self.with_core(|core| core.pause());
    }

    pub fn toggle(&self) {
        self.with_core(|core| core.toggle());
    }

    /// Re-issues playback on the active backend after an interruption.
    pub fn keep_playing(&self) {
        self.with_core(|core| {
            if let Some(backend) = core.active_backend_mut() {
                backend.keep_playing();
            }
        });
    }

    /// Moves to the nearest playable track before the current one. Returns
    /// false and emits `PreviousPlaylistRequested` when there is none.
    pub fn previous(&self) -> bool {
        self.with_core(|core| core.step(Direction::Backward))
    }

    /// Moves to the nearest playable track after the current one. Returns
    /// false and emits `NextPlaylistRequested` when there is none.
    pub fn next(&self) -> bool {
        self.with_core(|core| core.step(Direction::Forward))
    }

    pub fn seek_to_time(&self, time: Duration) {
        self.with_core(|core| core.seek_to_time(time));
    }

    /// Drains pending engine callbacks of every backend and publishes the
    /// resulting events. Call it from the application's main loop.
    pub fn process_events(&self) {
        self.with_core(|core| {
            for backend in core.backends.iter_mut() {
                backend.pump_signals();
            }
        });
    }

    /// Announces that the upcoming track became available.
    pub fn next_track_added(&self) {
        self.with_core(|core| core.outbox.push(QueuePlayerEvent::NextTrackAdded));
    }

    pub fn playlist_queue(&self) -> Option<Arc<PlaylistQueue>> {
        self.with_core(|core| core.queue.clone())
    }

    pub fn current_position(&self) -> Option<Position> {
        self.with_core(|core| core.position)
    }

    pub fn current_track_index(&self) -> Option<usize> {
        self.current_position().map(|p| p.track_index)
    }

    pub fn current_track(&self) -> Option<TrackRef> {
        self.with_core(|core| core.current_track())
    }

    pub fn current_playlist(&self) -> Option<PlaylistRef> {
        self.with_core(|core| core.current_playlist())
    }

    /// Same-backend run of tracks around the current one.
    pub fn current_track_list(&self) -> Option<TrackList> {
        self.with_core(|core| {
            let position = core.position?;
            let playlist = core.current_playlist()?;
            TrackList::same_backend_run(&playlist, position.track_index)
        })
    }

    pub fn previous_track(&self) -> Option<TrackRef> {
        self.with_core(|core| core.neighbour(Direction::Backward).map(|(_, t)| t))
    }

    pub fn next_track(&self) -> Option<TrackRef> {
        self.with_core(|core| core.neighbour(Direction::Forward).map(|(_, t)| t))
    }

    /// State of the active backend, `Init` without a selection.
    pub fn current_state(&self) -> PlayerState {
        self.with_core(|core| core.current_state())
    }

    pub fn playing_info(&self) -> Option<PlayingInfo> {
        self.with_core(|core| core.active_backend().and_then(|b| b.playing_info()))
    }

    pub fn active_backend(&self) -> Option<PlayerType> {
        self.with_core(|core| core.active)
    }

    pub fn backend_state(&self, player_type: PlayerType) -> Option<PlayerState> {
        self.with_core(|core| core.backends.get(player_type).map(|b| b.state()))
    }

    pub fn backend_types(&self) -> Vec<PlayerType> {
        self.with_core(|core| core.backends.types())
    }
}

impl Observable for QueuePlayer {
    type Event = QueuePlayerEvent;

    fn observers(&self) -> &ObserverList<QueuePlayerEvent> {
        &self.shared.observers
    }
}

impl Drop for QueuePlayerShared {
    fn drop(&mut self) {
        if let Ok(core) = self.core.get_mut() {
            if let Some(queue) = core.queue.take() {
                queue.release_player(&core.this);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl QueuePlayerCore {
    fn playlists(&self) -> Vec<PlaylistRef> {
        self.queue
            .as_ref()
            .map(|q| q.playlists())
            .unwrap_or_default()
    }

    fn current_playlist(&self) -> Option<PlaylistRef> {
        let position = self.position?;
        self.queue.as_ref()?.playlist(position.playlist_index)
    }

    fn current_track(&self) -> Option<TrackRef> {
        let position = self.position?;
        self.current_playlist()?.track(position.track_index)
    }

    fn selection(&self) -> Option<SelectedTrack> {
        let position = self.position?;
        let playlist = self.current_playlist()?;
        let track = playlist.track(position.track_index)?;
        Some((track, position.track_index, playlist))
    }

    /// A track the player may land on: valid, with a backend to play it.
    fn is_playable(&self, track: &TrackRef) -> bool {
        track.is_valid() && self.backends.contains(track.player_type())
    }

    fn active_backend(&self) -> Option<&ServicePlayerBackend> {
        self.backends.get(self.active?)
    }

    fn active_backend_mut(&mut self) -> Option<&mut ServicePlayerBackend> {
        let active = self.active?;
        self.backends.get_mut(active)
    }

    fn current_state(&self) -> PlayerState {
        self.active_backend()
            .map(|b| b.state())
            .unwrap_or_default()
    }

    fn neighbour(&self, direction: Direction) -> Option<(Position, TrackRef)> {
        let from = self.position?;
        let playlists = self.playlists();
        let is_playable = |t: &TrackRef| self.is_playable(t);
        let target = match direction {
            Direction::Forward => next_position(&playlists, from, is_playable),
            Direction::Backward => previous_position(&playlists, from, is_playable),
        }?;
        let track = target.track(&playlists)?;
        Some((target, track))
    }

    fn is_current(&self, queue: &Arc<PlaylistQueue>, target: Position) -> bool {
        self.position == Some(target)
            && self
                .queue
                .as_ref()
                .is_some_and(|current| **current == **queue)
    }

    /// Makes `queue` the current queue and moves the back-reference.
    fn adopt_queue(&mut self, queue: &Arc<PlaylistQueue>) {
        if let Some(current) = &self.queue {
            if Arc::ptr_eq(current, queue) {
                return;
            }
        }
        if let Some(old) = self.queue.take() {
            old.release_player(&self.this);
        }
        queue.set_player(self.this.clone());
        self.queue = Some(queue.clone());
    }

    fn select(&mut self, track_index: usize, playlist: &PlaylistRef, queue: &Arc<PlaylistQueue>) -> Selection {
        let Some(playlist_index) = queue.index_of(playlist) else {
            warn!(playlist = playlist.id(), "Playlist is not part of the queue");
            return Selection::Rejected;
        };
        let target = Position::new(playlist_index, track_index);

        if self.is_current(queue, target) {
            self.adopt_queue(queue);
            debug!(position = %target, "Track already selected");
            return Selection::Unchanged;
        }

        let Some(track) = queue.playlist(playlist_index).and_then(|p| p.track(track_index)) else {
            warn!(playlist = playlist.id(), track_index, "Track index out of range");
            return Selection::Rejected;
        };
        if !self.is_playable(&track) {
            debug!(
                playlist = playlist.id(),
                track_index,
                backend = %track.player_type(),
                "Track is not playable"
            );
            return Selection::Rejected;
        }

        let previous = self.selection();
        self.adopt_queue(queue);
        self.move_to(previous, target, track);
        Selection::Changed
    }

    /// Switches the selection to `target` and prepares its track.
    fn move_to(&mut self, previous: Option<SelectedTrack>, target: Position, track: TrackRef) {
        if let Some((track, index, playlist)) = previous {
            self.outbox.push(QueuePlayerEvent::TrackUnselected {
                track,
                index,
                playlist,
            });
        }

        let player_type = track.player_type();
        if let Some(backend) = self.active_backend_mut() {
            backend.clear_player();
        }
        if let Some(backend) = self.backends.get_mut(player_type) {
            backend.clear_player();
        }
        // Teardown noise from the cleared backends is not republished.
        while self.backend_events.try_recv().is_ok() {}

        self.position = Some(target);
        self.active = Some(player_type);
        if let Some(backend) = self.backends.get_mut(player_type) {
            backend.prepare(track.clone());
        }

        let Some(playlist) = self.current_playlist() else {
            return;
        };
        info!(
            playlist = playlist.id(),
            track_index = target.track_index,
            backend = %player_type,
            title = ?track.title(),
            "Track selected"
        );
        self.outbox.push(QueuePlayerEvent::TrackSelected {
            track,
            index: target.track_index,
            playlist,
        });
    }

    fn play(&mut self) {
        if let Some(backend) = self.active_backend_mut() {
            backend.play();
        }
    }

    fn pause(&mut self) {
        if let Some(backend) = self.active_backend_mut() {
            backend.pause();
        }
    }

    fn toggle(&mut self) {
        if let Some(backend) = self.active_backend_mut() {
            backend.toggle();
        }
    }

    fn step(&mut self, direction: Direction) -> bool {
        if self.position.is_none() {
            debug!(direction = ?direction, "No current track to move from");
            return false;
        }
        let was_playing = self.current_state().is_playing();

        match self.neighbour(direction) {
            Some((target, track)) => {
                debug!(direction = ?direction, position = %target, "Moving to neighbour track");
                let previous = self.selection();
                self.move_to(previous, target, track);
                if was_playing {
                    self.play();
                }
                true
            }
            None => {
                debug!(direction = ?direction, "No playable neighbour, requesting more content");
                self.outbox.push(match direction {
                    Direction::Forward => QueuePlayerEvent::NextPlaylistRequested,
                    Direction::Backward => QueuePlayerEvent::PreviousPlaylistRequested,
                });
                false
            }
        }
    }

    fn seek_to_time(&mut self, time: Duration) {
        let Some(backend) = self.active_backend_mut() else {
            return;
        };
        backend.seek_to_time(time);

        let mark = self.outbox.len();
        self.dispatch_backend_events();
        let reported = self.outbox[mark..]
            .iter()
            .any(|e| matches!(e, QueuePlayerEvent::TimeUpdated));
        if !reported {
            self.outbox.push(QueuePlayerEvent::TimeUpdated);
        }
    }

    fn on_end_of_track(&mut self) {
        self.outbox.push(QueuePlayerEvent::DidPlayToEndTime);
        match self.neighbour(Direction::Forward) {
            Some((target, track)) => {
                debug!(position = %target, "Advancing after end of track");
                let previous = self.selection();
                self.move_to(previous, target, track);
                self.play();
            }
            None => {
                info!("Queue exhausted");
                self.outbox.push(QueuePlayerEvent::NextPlaylistRequested);
            }
        }
    }

    /// Republishes events of the active backend. Events from other backends
    /// are stale and dropped.
    fn dispatch_backend_events(&mut self) {
        while let Ok((player_type, event)) = self.backend_events.try_recv() {
            if self.active != Some(player_type) {
                debug!(backend = %player_type, event = ?event, "Ignoring event from inactive backend");
                continue;
            }
            match event {
                ServicePlayerEvent::TimeUpdated => self.outbox.push(QueuePlayerEvent::TimeUpdated),
                ServicePlayerEvent::StatusChanged(state) => {
                    self.outbox.push(QueuePlayerEvent::StatusChanged(state))
                }
                ServicePlayerEvent::ErrorOccured { message } => {
                    warn!(backend = %player_type, error = %message, "Backend error");
                    self.outbox.push(QueuePlayerEvent::ErrorOccured {
                        backend: player_type,
                        message,
                    });
                }
                ServicePlayerEvent::DidPlayToEndTime => self.on_end_of_track(),
            }
        }
    }
}
