//! Backend for the streaming SDK.
//!
//! Every command is ignored while the SDK session is not logged in.

use std::time::Duration;

use tracing::{debug, warn};

use crate::model::{PlayerState, PlayerType, PlayingInfo, Track, TrackRef};
use crate::observable::{Observable, ObserverList};
use crate::service_player::signals::{SignalChannel, SignalSender};
use crate::service_player::{ServicePlayer, ServicePlayerCore, ServicePlayerEvent};

/// Asynchronous commands whose completion the SDK reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamingCommand {
    SetPlaying,
    SetPaused,
    Seek,
}

/// Delegate callbacks and command completions from the streaming SDK.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamingSignal {
    PlaybackStatusChanged { is_playing: bool },
    PositionChanged(Duration),
    /// The SDK moved past the current item.
    DidPopQueue,
    PlayUriCompleted(Result<(), String>),
    CommandCompleted {
        command: StreamingCommand,
        result: Result<(), String>,
    },
}

pub trait StreamingEngine: Send {
    fn is_logged_in(&self) -> bool;
    /// Installs the playback delegate.
    fn attach(&mut self, signals: SignalSender<StreamingSignal>);
    fn detach(&mut self);
    /// Starts loading `uri` at position zero; completion arrives as
    /// [`StreamingSignal::PlayUriCompleted`].
    fn play_uri(&mut self, uri: &str);
    fn set_is_playing(&mut self, playing: bool);
    fn seek(&mut self, position: Duration);
    fn current_track_duration(&self) -> Option<Duration>;
    fn position(&self) -> Duration;
}

pub struct SpotifyPlayer {
    core: ServicePlayerCore,
    engine: Box<dyn StreamingEngine>,
    signals: SignalChannel<StreamingSignal>,
    loaded: bool,
}

impl std::fmt::Debug for SpotifyPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyPlayer")
            .field("state", &self.core.state())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl SpotifyPlayer {
    pub fn new(engine: Box<dyn StreamingEngine>) -> Self {
        Self {
            core: ServicePlayerCore::new(PlayerType::Spotify),
            engine,
            signals: SignalChannel::new(),
            loaded: false,
        }
    }

    fn ready(&self) -> bool {
        self.loaded && self.engine.is_logged_in()
    }

    fn on_play_uri_completed(&mut self, result: Result<(), String>) {
        let playing = self.core.state().is_playing();
        self.engine.set_is_playing(playing);
        if let Err(message) = result {
            warn!(backend = %PlayerType::Spotify, error = %message, "Failed to play uri");
            self.core.error(message);
        }
    }

    fn on_command_completed(&mut self, command: StreamingCommand, result: Result<(), String>) {
        if command == StreamingCommand::SetPaused {
            self.core.set_state(PlayerState::Pause);
        }
        if let Err(message) = result {
            warn!(backend = %PlayerType::Spotify, command = ?command, error = %message, "Streaming command failed");
            self.core.error(message);
        }
    }
}

impl Observable for SpotifyPlayer {
    type Event = ServicePlayerEvent;

    fn observers(&self) -> &ObserverList<ServicePlayerEvent> {
        self.core.observers()
    }
}

impl ServicePlayer for SpotifyPlayer {
    fn player_type(&self) -> PlayerType {
        PlayerType::Spotify
    }

    fn state(&self) -> PlayerState {
        self.core.state()
    }

    fn playing_info(&self) -> Option<PlayingInfo> {
        if !self.ready() {
            return None;
        }
        self.engine
            .current_track_duration()
            .map(|duration| PlayingInfo::new(duration, self.engine.position()))
    }

    fn track(&self) -> Option<TrackRef> {
        self.core.track()
    }

    fn set_track(&mut self, track: Option<TrackRef>) {
        self.core.set_track(track);
    }

    fn prepare_player(&mut self) {
        if !self.engine.is_logged_in() {
            debug!(backend = %PlayerType::Spotify, "Not logged in, prepare ignored");
            return;
        }
        let Some(track) = self.core.track() else {
            return;
        };
        let Some(uri) = track.spotify_uri().filter(|_| track.is_valid()) else {
            return;
        };

        self.engine.attach(self.signals.sender());
        self.loaded = true;
        self.core.set_state(PlayerState::Load);
        self.engine.play_uri(&uri);
    }

    fn play(&mut self) {
        if !self.ready() {
            return;
        }
        self.core.set_state(PlayerState::LoadToPlay);
        self.engine.set_is_playing(true);
    }

    /// Passes through `Load` until the SDK confirms the pause.
    fn pause(&mut self) {
        if !self.ready() {
            return;
        }
        self.core.set_state(PlayerState::Load);
        self.engine.set_is_playing(false);
    }

    fn seek_to_time(&mut self, time: Duration) {
        if self.ready() {
            self.engine.seek(time);
        }
        self.core.emit(ServicePlayerEvent::TimeUpdated);
    }

    fn clear_player(&mut self) {
        self.signals.reset();
        if self.loaded && self.engine.is_logged_in() {
            self.engine.set_is_playing(false);
            self.engine.detach();
        }
        self.loaded = false;
        self.core.set_track(None);
        self.core.set_state(PlayerState::Init);
    }

    fn keep_playing(&mut self) {
        if self.core.state().is_playing() {
            self.play();
        }
    }

    fn pump_signals(&mut self) {
        for signal in self.signals.drain() {
            match signal {
                StreamingSignal::PlaybackStatusChanged { is_playing } => {
                    if self.core.state() == PlayerState::Play && !is_playing {
                        self.core.set_state(PlayerState::Pause);
                    }
                }
                StreamingSignal::PositionChanged(_) => {
                    if self.core.state() == PlayerState::LoadToPlay {
                        self.core.set_state(PlayerState::Play);
                    }
                    self.core.emit(ServicePlayerEvent::TimeUpdated);
                }
                StreamingSignal::DidPopQueue => {
                    self.core.emit(ServicePlayerEvent::DidPlayToEndTime);
                }
                StreamingSignal::PlayUriCompleted(result) => self.on_play_uri_completed(result),
                StreamingSignal::CommandCompleted { command, result } => {
                    self.on_command_completed(command, result)
                }
            }
        }
    }
}
