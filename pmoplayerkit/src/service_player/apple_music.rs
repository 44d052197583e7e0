//! Backend for subscription catalog tracks, played through the system music
//! player controller.

use std::time::{Duration, Instant};

use tracing::{debug, error, warn};

use crate::config::AppleMusicPlayerConfig;
use crate::errors::{CatalogErrorCode, PlayerKitError};
use crate::model::{PlayerState, PlayerType, PlayingInfo, Track, TrackRef};
use crate::observable::{Observable, ObserverList};
use crate::service_player::signals::{SignalChannel, SignalSender};
use crate::service_player::ticker::Ticker;
use crate::service_player::{ServicePlayer, ServicePlayerCore, ServicePlayerEvent};

/// Playback state as reported by the music player controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogPlaybackState {
    Stopped,
    Playing,
    Paused,
    Interrupted,
    SeekingForward,
    SeekingBackward,
}

/// Notifications and completions from the music player controller.
#[derive(Clone, Debug, PartialEq)]
pub enum CatalogSignal {
    PlaybackStateChanged,
    NowPlayingItemChanged,
    /// Completion of [`MusicCatalogEngine::prepare_to_play`].
    PrepareCompleted(Result<(), CatalogErrorCode>),
}

pub trait MusicCatalogEngine: Send {
    /// Queues the store item `store_id` as the start item and routes the
    /// controller notifications to `signals`.
    fn set_queue(
        &mut self,
        store_id: &str,
        signals: SignalSender<CatalogSignal>,
    ) -> Result<(), PlayerKitError>;
    fn is_prepared_to_play(&self) -> bool;
    /// Starts preparing the queue; completion arrives as
    /// [`CatalogSignal::PrepareCompleted`].
    fn prepare_to_play(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn playback_state(&self) -> CatalogPlaybackState;
    /// Duration of the now playing item, `None` when there is none.
    fn now_playing_duration(&self) -> Option<Duration>;
    fn current_playback_time(&self) -> Duration;
    fn set_current_playback_time(&mut self, time: Duration);
}

pub struct AppleMusicPlayer {
    core: ServicePlayerCore,
    engine: Box<dyn MusicCatalogEngine>,
    signals: SignalChannel<CatalogSignal>,
    config: AppleMusicPlayerConfig,
    ticker: Ticker,
    /// Pending playback state sync after a state-changed notification.
    sync_at: Option<Instant>,
    loaded: bool,
}

impl std::fmt::Debug for AppleMusicPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppleMusicPlayer")
            .field("state", &self.core.state())
            .field("loaded", &self.loaded)
            .field("ticker", &self.ticker.is_active())
            .finish()
    }
}

impl AppleMusicPlayer {
    pub fn new(engine: Box<dyn MusicCatalogEngine>, config: AppleMusicPlayerConfig) -> Self {
        let ticker = Ticker::new(config.tick_interval());
        Self {
            core: ServicePlayerCore::new(PlayerType::AppleMusic),
            engine,
            signals: SignalChannel::new(),
            config,
            ticker,
            sync_at: None,
            loaded: false,
        }
    }

    fn sync_playback_state(&mut self) {
        match self.engine.playback_state() {
            CatalogPlaybackState::Playing => self.core.set_state(PlayerState::Play),
            CatalogPlaybackState::Paused
            | CatalogPlaybackState::Stopped
            | CatalogPlaybackState::Interrupted => self.core.set_state(PlayerState::Pause),
            _ => {}
        }
    }

    fn on_now_playing_item_changed(&mut self) {
        if self.engine.now_playing_duration().is_some() {
            return;
        }
        if self.core.state() == PlayerState::Play {
            self.core.emit(ServicePlayerEvent::DidPlayToEndTime);
        }
    }

    fn on_prepare_completed(&mut self, result: Result<(), CatalogErrorCode>) {
        let code = match result {
            Ok(()) => {
                self.engine.play();
                return;
            }
            Err(code) => code,
        };

        match code {
            // The item cannot be played here; skip it.
            CatalogErrorCode::CloudServiceCapabilityMissing
            | CatalogErrorCode::NotFound
            | CatalogErrorCode::NotSupported
            | CatalogErrorCode::PermissionDenied => {
                warn!(backend = %PlayerType::AppleMusic, code = ?code, "Catalog item unplayable, skipping");
                self.core.emit(ServicePlayerEvent::DidPlayToEndTime);
            }
            CatalogErrorCode::NetworkConnectionFailed
            | CatalogErrorCode::Unknown
            | CatalogErrorCode::RequestTimedOut => {
                let err = PlayerKitError::Catalog(code);
                error!(backend = %PlayerType::AppleMusic, error = %err, "Prepare to play failed");
                self.core.error(err.to_string());
            }
            CatalogErrorCode::Cancelled => {
                debug!(backend = %PlayerType::AppleMusic, "Prepare to play cancelled");
                if self.core.state() == PlayerState::LoadToPlay {
                    self.engine.play();
                }
            }
        }
    }

    fn on_tick(&mut self) {
        self.core.emit(ServicePlayerEvent::TimeUpdated);
        if self.engine.playback_state() == CatalogPlaybackState::Playing {
            self.core.set_state(PlayerState::Play);
        }
    }
}

impl Observable for AppleMusicPlayer {
    type Event = ServicePlayerEvent;

    fn observers(&self) -> &ObserverList<ServicePlayerEvent> {
        self.core.observers()
    }
}

impl ServicePlayer for AppleMusicPlayer {
    fn player_type(&self) -> PlayerType {
        PlayerType::AppleMusic
    }

    fn state(&self) -> PlayerState {
        self.core.state()
    }

    fn playing_info(&self) -> Option<PlayingInfo> {
        if !self.loaded {
            return None;
        }
        self.engine
            .now_playing_duration()
            .map(|duration| PlayingInfo::new(duration, self.engine.current_playback_time()))
    }

    fn track(&self) -> Option<TrackRef> {
        self.core.track()
    }

    fn set_track(&mut self, track: Option<TrackRef>) {
        self.core.set_track(track);
    }

    fn prepare_player(&mut self) {
        let Some(track) = self.core.track() else {
            return;
        };
        let Some(store_id) = track.apple_music_id().filter(|_| track.is_valid()) else {
            return;
        };

        if let Err(err) = self.engine.set_queue(&store_id, self.signals.sender()) {
            warn!(backend = %PlayerType::AppleMusic, store_id = %store_id, error = %err, "Failed to set catalog queue");
            self.core.error(err.to_string());
            return;
        }

        self.loaded = true;
        self.ticker.start(Instant::now());
        self.engine.set_current_playback_time(Duration::ZERO);
        self.core.set_state(PlayerState::Load);
    }

    fn play(&mut self) {
        if !self.loaded {
            return;
        }
        self.core.set_state(PlayerState::LoadToPlay);
        if self.engine.is_prepared_to_play() {
            self.engine.play();
            return;
        }
        // Playback starts from the prepare completion.
        self.engine.prepare_to_play();
    }

    fn pause(&mut self) {
        if !self.loaded {
            return;
        }
        self.core.set_state(PlayerState::Pause);
        self.engine.pause();
    }

    fn seek_to_time(&mut self, time: Duration) {
        if self.loaded {
            self.engine.set_current_playback_time(time);
        }
        self.core.emit(ServicePlayerEvent::TimeUpdated);
    }

    fn clear_player(&mut self) {
        self.signals.reset();
        self.ticker.cancel();
        self.sync_at = None;
        if self.loaded {
            self.engine.pause();
            self.loaded = false;
        }
        self.core.set_track(None);
        self.core.set_state(PlayerState::Init);
    }

    fn keep_playing(&mut self) {
        if self.loaded && self.core.state().is_playing() {
            self.engine.pause();
            self.engine.play();
        }
    }

    fn pump_signals(&mut self) {
        for signal in self.signals.drain() {
            match signal {
                CatalogSignal::PlaybackStateChanged => {
                    self.sync_at = Some(Instant::now() + self.config.state_sync_delay());
                }
                CatalogSignal::NowPlayingItemChanged => self.on_now_playing_item_changed(),
                CatalogSignal::PrepareCompleted(result) => self.on_prepare_completed(result),
            }
        }

        let now = Instant::now();
        if self.sync_at.is_some_and(|at| now >= at) {
            self.sync_at = None;
            self.sync_playback_state();
        }
        if self.ticker.poll(now) {
            self.on_tick();
        }
    }
}
