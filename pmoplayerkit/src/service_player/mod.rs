//! Backend players.
//!
//! Each backend player wraps exactly one playback engine and exposes the
//! uniform [`ServicePlayer`] surface. Engines are the seam to the platform
//! or vendor SDK: commands go down through a trait object, asynchronous
//! callbacks come back as typed signals on a [`SignalChannel`] owned by the
//! player and drained by [`ServicePlayer::pump_signals`].

pub mod apple_music;
pub mod backend;
pub mod normal;
pub mod signals;
pub mod spotify;
pub mod ticker;
pub mod youtube;

use tracing::debug;

use crate::model::{PlayerState, PlayerType, PlayingInfo, TrackRef};
use crate::observable::{Observable, ObserverList};

pub use apple_music::{AppleMusicPlayer, CatalogPlaybackState, CatalogSignal, MusicCatalogEngine};
pub use backend::{BackendEvent, BackendRegistry, PlayerEngines, ServicePlayerBackend};
pub use normal::{AvPlayerStatus, AvQueueEngine, AvQueueSignal, NormalPlayer};
pub use signals::{SignalChannel, SignalSender};
pub use spotify::{SpotifyPlayer, StreamingCommand, StreamingEngine, StreamingSignal};
pub use ticker::Ticker;
pub use youtube::{VideoEmbedEngine, VideoPlayerState, VideoSignal, YouTubePlayer};

/// Backend-local events, re-published by the queue player.
#[derive(Clone, Debug, PartialEq)]
pub enum ServicePlayerEvent {
    TimeUpdated,
    DidPlayToEndTime,
    StatusChanged(PlayerState),
    ErrorOccured { message: String },
}

/// Uniform surface of a backend player.
///
/// Implementors provide the primitives; [`prepare`](ServicePlayer::prepare),
/// [`toggle`](ServicePlayer::toggle) and
/// [`play_track`](ServicePlayer::play_track) are derived from them.
pub trait ServicePlayer: Observable<Event = ServicePlayerEvent> {
    fn player_type(&self) -> PlayerType;
    fn state(&self) -> PlayerState;
    /// `None` when no track is loaded or the engine cannot report a position.
    fn playing_info(&self) -> Option<PlayingInfo>;
    fn track(&self) -> Option<TrackRef>;
    fn set_track(&mut self, track: Option<TrackRef>);

    /// Backend-specific loading of the stored track. Does nothing when the
    /// track lacks the locator this backend needs.
    fn prepare_player(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    /// Seeks, then always reports `TimeUpdated`.
    fn seek_to_time(&mut self, time: std::time::Duration);
    /// Releases engine resources. Safe to call when nothing is loaded.
    fn clear_player(&mut self);
    /// Re-issues playback after an interruption when in a playing state.
    fn keep_playing(&mut self);
    /// Drains pending engine callbacks and turns them into events.
    fn pump_signals(&mut self);

    fn prepare(&mut self, track: TrackRef) {
        self.set_track(Some(track));
        self.prepare_player();
    }

    fn toggle(&mut self) {
        if self.state().is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    fn play_track(&mut self, track: TrackRef) {
        self.clear_player();
        self.prepare(track);
        self.play();
    }
}

/// Track, lifecycle state and observers shared by every backend player.
#[derive(Debug)]
pub struct ServicePlayerCore {
    player_type: PlayerType,
    track: Option<TrackRef>,
    state: PlayerState,
    observers: ObserverList<ServicePlayerEvent>,
}

impl ServicePlayerCore {
    pub fn new(player_type: PlayerType) -> Self {
        Self {
            player_type,
            track: None,
            state: PlayerState::Init,
            observers: ObserverList::new(),
        }
    }

    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    pub fn track(&self) -> Option<TrackRef> {
        self.track.clone()
    }

    pub fn set_track(&mut self, track: Option<TrackRef>) {
        self.track = track;
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Updates the state, reporting `StatusChanged` only on an actual change.
    pub fn set_state(&mut self, state: PlayerState) {
        if self.state == state {
            return;
        }
        debug!(
            backend = %self.player_type,
            from = ?self.state,
            to = ?state,
            "Backend state changed"
        );
        self.state = state;
        self.emit(ServicePlayerEvent::StatusChanged(state));
    }

    pub fn emit(&self, event: ServicePlayerEvent) {
        self.observers.notify(&event);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(ServicePlayerEvent::ErrorOccured {
            message: message.into(),
        });
    }

    pub fn observers(&self) -> &ObserverList<ServicePlayerEvent> {
        &self.observers
    }
}
