//! Backend for embedded videos.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::YouTubePlayerConfig;
use crate::errors::PlayerKitError;
use crate::model::{PlayerState, PlayerType, PlayingInfo, Track, TrackRef};
use crate::observable::{Observable, ObserverList};
use crate::service_player::signals::{SignalChannel, SignalSender};
use crate::service_player::{ServicePlayer, ServicePlayerCore, ServicePlayerEvent};

/// State of the embedded video player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VideoPlayerState {
    /// No video was ever loaded into the view.
    Unknown,
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Queued,
}

#[derive(Clone, Debug, PartialEq)]
pub enum VideoSignal {
    BecameReady,
    StateChanged(VideoPlayerState),
    PlayTime(Duration),
    Error(String),
    DidPlayToEndTime,
}

pub trait VideoEmbedEngine: Send {
    fn attach(&mut self, signals: SignalSender<VideoSignal>);
    fn detach(&mut self);
    fn player_state(&self) -> VideoPlayerState;
    /// First load of the embed, with the player variables.
    fn load(&mut self, video_id: &str, config: &YouTubePlayerConfig) -> Result<(), PlayerKitError>;
    /// Cues a video into an already loaded embed.
    fn cue(&mut self, video_id: &str, start: Duration) -> Result<(), PlayerKitError>;
    fn play_video(&mut self);
    fn pause_video(&mut self);
    fn seek(&mut self, to: Duration, allow_seek_ahead: bool);
    fn duration(&self) -> Duration;
    fn current_time(&self) -> Duration;
}

pub struct YouTubePlayer {
    core: ServicePlayerCore,
    engine: Box<dyn VideoEmbedEngine>,
    signals: SignalChannel<VideoSignal>,
    config: YouTubePlayerConfig,
    loaded: bool,
}

impl std::fmt::Debug for YouTubePlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubePlayer")
            .field("state", &self.core.state())
            .field("loaded", &self.loaded)
            .finish()
    }
}

impl YouTubePlayer {
    pub fn new(engine: Box<dyn VideoEmbedEngine>, config: YouTubePlayerConfig) -> Self {
        Self {
            core: ServicePlayerCore::new(PlayerType::YouTube),
            engine,
            signals: SignalChannel::new(),
            config,
            loaded: false,
        }
    }
}

impl Observable for YouTubePlayer {
    type Event = ServicePlayerEvent;

    fn observers(&self) -> &ObserverList<ServicePlayerEvent> {
        self.core.observers()
    }
}

impl ServicePlayer for YouTubePlayer {
    fn player_type(&self) -> PlayerType {
        PlayerType::YouTube
    }

    fn state(&self) -> PlayerState {
        self.core.state()
    }

    fn playing_info(&self) -> Option<PlayingInfo> {
        if !self.loaded {
            return None;
        }
        Some(PlayingInfo::new(
            self.engine.duration(),
            self.engine.current_time(),
        ))
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
        let Some(video_id) = track.youtube_video_id().filter(|_| track.is_valid()) else {
            return;
        };

        self.engine.attach(self.signals.sender());
        let result = match self.engine.player_state() {
            VideoPlayerState::Unknown => self.engine.load(&video_id, &self.config),
            _ => self.engine.cue(&video_id, Duration::ZERO),
        };

        match result {
            Ok(()) => {
                debug!(backend = %PlayerType::YouTube, video_id = %video_id, "Video cued");
                self.loaded = true;
                self.core.set_state(PlayerState::Load);
            }
            Err(err) => {
                warn!(backend = %PlayerType::YouTube, video_id = %video_id, error = %err, "Failed to load video");
                self.core.error(err.to_string());
            }
        }
    }

    fn play(&mut self) {
        if !self.loaded {
            return;
        }
        self.core.set_state(PlayerState::LoadToPlay);
        self.engine.play_video();
        self.core.set_state(PlayerState::Play);
    }

    fn pause(&mut self) {
        if !self.loaded {
            return;
        }
        self.engine.pause_video();
        self.core.set_state(PlayerState::Pause);
    }

    fn seek_to_time(&mut self, time: Duration) {
        if self.loaded {
            self.engine.seek(time, true);
        }
        self.core.emit(ServicePlayerEvent::TimeUpdated);
    }

    fn clear_player(&mut self) {
        self.signals.reset();
        if self.loaded {
            self.engine.pause_video();
            self.engine.detach();
            self.loaded = false;
        }
        self.core.set_track(None);
        self.core.set_state(PlayerState::Init);
    }

    // The embed resumes on its own after interruptions.
    fn keep_playing(&mut self) {}

    fn pump_signals(&mut self) {
        for signal in self.signals.drain() {
            match signal {
                VideoSignal::BecameReady => match self.core.state() {
                    PlayerState::LoadToPlay | PlayerState::Play => self.engine.play_video(),
                    _ => self.core.set_state(PlayerState::Load),
                },
                VideoSignal::StateChanged(VideoPlayerState::Paused) => {
                    self.core.set_state(PlayerState::Pause)
                }
                VideoSignal::StateChanged(VideoPlayerState::Playing) => {
                    self.core.set_state(PlayerState::Play)
                }
                VideoSignal::StateChanged(_) => {}
                VideoSignal::PlayTime(_) => self.core.emit(ServicePlayerEvent::TimeUpdated),
                VideoSignal::Error(message) => {
                    warn!(backend = %PlayerType::YouTube, error = %message, "Video player error");
                    self.core.error(message);
                    self.core.set_state(PlayerState::Pause);
                }
                VideoSignal::DidPlayToEndTime => {
                    self.core.emit(ServicePlayerEvent::DidPlayToEndTime)
                }
            }
        }
    }
}
