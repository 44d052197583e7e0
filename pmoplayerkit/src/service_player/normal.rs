//! Backend for local files and HTTP streams, played through a native AV
//! queue engine.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::NormalPlayerConfig;
use crate::errors::PlayerKitError;
use crate::model::{PlayerState, PlayerType, PlayingInfo, Track, TrackRef};
use crate::observable::{Observable, ObserverList};
use crate::service_player::signals::{SignalChannel, SignalSender};
use crate::service_player::{ServicePlayer, ServicePlayerCore, ServicePlayerEvent};

/// Readiness reported by the AV queue engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AvPlayerStatus {
    Unknown,
    ReadyToPlay,
    Failed,
}

/// Callbacks from the AV queue engine.
#[derive(Clone, Debug, PartialEq)]
pub enum AvQueueSignal {
    /// The engine status changed; read it back with [`AvQueueEngine::status`].
    StatusChanged,
    /// Periodic time observer fired.
    PeriodicTime(Duration),
    /// The current item reached its end.
    DidPlayToEndTime,
}

/// Native AV queue player.
pub trait AvQueueEngine: Send {
    /// Replaces the queue with a single item for `url`, rewinds it, and
    /// installs the status and periodic time observers on `signals`.
    fn load(
        &mut self,
        url: &str,
        time_interval: Duration,
        signals: SignalSender<AvQueueSignal>,
    ) -> Result<(), PlayerKitError>;
    fn status(&self) -> AvPlayerStatus;
    fn item_count(&self) -> usize;
    fn remove_current_item(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, time: Duration, timescale: i32);
    /// Duration of the current item, `None` without one.
    fn duration(&self) -> Option<Duration>;
    fn current_time(&self) -> Option<Duration>;
    /// Pauses, empties the queue and removes the observers.
    fn teardown(&mut self);
}

pub struct NormalPlayer {
    core: ServicePlayerCore,
    engine: Box<dyn AvQueueEngine>,
    signals: SignalChannel<AvQueueSignal>,
    config: NormalPlayerConfig,
    loaded: bool,
}

impl std::fmt::Debug for NormalPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalPlayer")
            .field("state", &self.core.state())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl NormalPlayer {
    pub fn new(engine: Box<dyn AvQueueEngine>, config: NormalPlayerConfig) -> Self {
        Self {
            core: ServicePlayerCore::new(PlayerType::Normal),
            engine,
            signals: SignalChannel::new(),
            config,
            loaded: false,
        }
    }

    fn on_status_changed(&mut self) {
        if !self.loaded {
            return;
        }
        match self.engine.status() {
            AvPlayerStatus::ReadyToPlay => match self.core.state() {
                PlayerState::Load => self.core.set_state(PlayerState::Pause),
                PlayerState::LoadToPlay => {
                    self.core.set_state(PlayerState::Play);
                    self.core.emit(ServicePlayerEvent::TimeUpdated);
                }
                _ => {}
            },
            status => {
                warn!(backend = %PlayerType::Normal, status = ?status, "AV queue not playable");
                self.core.error(format!("AV queue status {:?}", status));
            }
        }
    }

    fn on_end_of_item(&mut self) {
        if self.loaded && self.engine.item_count() > 0 {
            self.engine.remove_current_item();
        }
        self.core.emit(ServicePlayerEvent::DidPlayToEndTime);
    }
}

impl Observable for NormalPlayer {
    type Event = ServicePlayerEvent;

    fn observers(&self) -> &ObserverList<ServicePlayerEvent> {
        self.core.observers()
    }
}

impl ServicePlayer for NormalPlayer {
    fn player_type(&self) -> PlayerType {
        PlayerType::Normal
    }

    fn state(&self) -> PlayerState {
        self.core.state()
    }

    fn playing_info(&self) -> Option<PlayingInfo> {
        if !self.loaded {
            return None;
        }
        let duration = self.engine.duration()?;
        let elapsed = self.engine.current_time()?;
        Some(PlayingInfo::new(duration, elapsed))
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
        let Some(url) = track.stream_url().filter(|_| track.is_valid()) else {
            return;
        };

        match self.engine.load(
            &url,
            self.config.time_update_interval(),
            self.signals.sender(),
        ) {
            Ok(()) => {
                debug!(backend = %PlayerType::Normal, url = %url, "AV item loaded");
                self.loaded = true;
                self.core.set_state(PlayerState::Load);
            }
            Err(err) => {
                warn!(backend = %PlayerType::Normal, url = %url, error = %err, "Failed to load AV item");
                self.core.error(err.to_string());
            }
        }
    }

    fn play(&mut self) {
        if !self.loaded {
            return;
        }
        if self.engine.item_count() == 0 {
            self.core.emit(ServicePlayerEvent::DidPlayToEndTime);
            return;
        }
        self.engine.play();
        if self.engine.status() == AvPlayerStatus::ReadyToPlay {
            self.core.set_state(PlayerState::Play);
        } else {
            self.core.set_state(PlayerState::LoadToPlay);
        }
    }

    fn pause(&mut self) {
        if !self.loaded {
            return;
        }
        self.engine.pause();
        self.core.set_state(PlayerState::Pause);
    }

    fn seek_to_time(&mut self, time: Duration) {
        if self.loaded {
            self.engine.seek(time, self.config.seek_timescale);
        }
        self.core.emit(ServicePlayerEvent::TimeUpdated);
    }

    fn clear_player(&mut self) {
        self.signals.reset();
        if self.loaded {
            self.engine.teardown();
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
                AvQueueSignal::StatusChanged => self.on_status_changed(),
                AvQueueSignal::PeriodicTime(_) => {
                    if self.loaded {
                        self.core.emit(ServicePlayerEvent::TimeUpdated);
                    }
                }
                AvQueueSignal::DidPlayToEndTime => self.on_end_of_item(),
            }
        }
    }
}
