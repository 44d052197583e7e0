//! Backend-agnostic façade and registry.
//!
//! `ServicePlayerBackend` wraps every concrete backend player behind one
//! type so that the queue player can hold them in a map keyed by
//! [`PlayerType`] and dispatch without trait objects.

use std::collections::BTreeMap;
use std::time::Duration;

use crossbeam_channel::{Receiver, unbounded};
use tracing::{debug, info};

use crate::config::PlayerKitConfig;
use crate::model::{PlayerState, PlayerType, PlayingInfo, TrackRef};
use crate::observable::{Observable, ObserverList};
use crate::service_player::apple_music::{AppleMusicPlayer, MusicCatalogEngine};
use crate::service_player::normal::{AvQueueEngine, NormalPlayer};
use crate::service_player::spotify::{SpotifyPlayer, StreamingEngine};
use crate::service_player::youtube::{VideoEmbedEngine, YouTubePlayer};
use crate::service_player::{ServicePlayer, ServicePlayerEvent};

#[derive(Debug)]
pub enum ServicePlayerBackend {
    /// Local files and HTTP streams.
    Normal(NormalPlayer),
    /// Subscription catalog.
    AppleMusic(AppleMusicPlayer),
    /// Streaming SDK.
    Spotify(SpotifyPlayer),
    /// Embedded video.
    YouTube(YouTubePlayer),
}

impl Observable for ServicePlayerBackend {
    type Event = ServicePlayerEvent;

    fn observers(&self) -> &ObserverList<ServicePlayerEvent> {
        match self {
            ServicePlayerBackend::Normal(p) => p.observers(),
            ServicePlayerBackend::AppleMusic(p) => p.observers(),
            ServicePlayerBackend::Spotify(p) => p.observers(),
            ServicePlayerBackend::YouTube(p) => p.observers(),
        }
    }
}

impl ServicePlayer for ServicePlayerBackend {
    fn player_type(&self) -> PlayerType {
        match self {
            ServicePlayerBackend::Normal(_) => PlayerType::Normal,
            ServicePlayerBackend::AppleMusic(_) => PlayerType::AppleMusic,
            ServicePlayerBackend::Spotify(_) => PlayerType::Spotify,
            ServicePlayerBackend::YouTube(_) => PlayerType::YouTube,
        }
    }

    fn state(&self) -> PlayerState {
        match self {
            ServicePlayerBackend::Normal(p) => p.state(),
            ServicePlayerBackend::AppleMusic(p) => p.state(),
            ServicePlayerBackend::Spotify(p) => p.state(),
            ServicePlayerBackend::YouTube(p) => p.state(),
        }
    }

    fn playing_info(&self) -> Option<PlayingInfo> {
        match self {
            ServicePlayerBackend::Normal(p) => p.playing_info(),
            ServicePlayerBackend::AppleMusic(p) => p.playing_info(),
            ServicePlayerBackend::Spotify(p) => p.playing_info(),
            ServicePlayerBackend::YouTube(p) => p.playing_info(),
        }
    }

    fn track(&self) -> Option<TrackRef> {
        match self {
            ServicePlayerBackend::Normal(p) => p.track(),
            ServicePlayerBackend::AppleMusic(p) => p.track(),
            ServicePlayerBackend::Spotify(p) => p.track(),
            ServicePlayerBackend::YouTube(p) => p.track(),
        }
    }

    fn set_track(&mut self, track: Option<TrackRef>) {
        match self {
            ServicePlayerBackend::Normal(p) => p.set_track(track),
            ServicePlayerBackend::AppleMusic(p) => p.set_track(track),
            ServicePlayerBackend::Spotify(p) => p.set_track(track),
            ServicePlayerBackend::YouTube(p) => p.set_track(track),
        }
    }

    fn prepare_player(&mut self) {
        match self {
            ServicePlayerBackend::Normal(p) => p.prepare_player(),
            ServicePlayerBackend::AppleMusic(p) => p.prepare_player(),
            ServicePlayerBackend::Spotify(p) => p.prepare_player(),
            ServicePlayerBackend::YouTube(p) => p.prepare_player(),
        }
    }

    fn play(&mut self) {
        match self {
            ServicePlayerBackend::Normal(p) => p.play(),
            ServicePlayerBackend::AppleMusic(p) => p.play(),
            ServicePlayerBackend::Spotify(p) => p.play(),
            ServicePlayerBackend::YouTube(p) => p.play(),
        }
    }

    fn pause(&mut self) {
        match self {
            ServicePlayerBackend::Normal(p) => p.pause(),
            ServicePlayerBackend::AppleMusic(p) => p.pause(),
            ServicePlayerBackend::Spotify(p) => p.pause(),
            ServicePlayerBackend::YouTube(p) => p.pause(),
        }
    }

    fn seek_to_time(&mut self, time: Duration) {
        match self {
            ServicePlayerBackend::Normal(p) => p.seek_to_time(time),
            ServicePlayerBackend::AppleMusic(p) => p.seek_to_time(time),
            ServicePlayerBackend::Spotify(p) => p.seek_to_time(time),
            ServicePlayerBackend::YouTube(p) => p.seek_to_time(time),
        }
    }

    fn clear_player(&mut self) {
        match self {
            ServicePlayerBackend::Normal(p) => p.clear_player(),
            ServicePlayerBackend::AppleMusic(p) => p.clear_player(),
            ServicePlayerBackend::Spotify(p) => p.clear_player(),
            ServicePlayerBackend::YouTube(p) => p.clear_player(),
        }
    }

    fn keep_playing(&mut self) {
        match self {
            ServicePlayerBackend::Normal(p) => p.keep_playing(),
            ServicePlayerBackend::AppleMusic(p) => p.keep_playing(),
            ServicePlayerBackend::Spotify(p) => p.keep_playing(),
            ServicePlayerBackend::YouTube(p) => p.keep_playing(),
        }
    }

    fn pump_signals(&mut self) {
        match self {
            ServicePlayerBackend::Normal(p) => p.pump_signals(),
            ServicePlayerBackend::AppleMusic(p) => p.pump_signals(),
            ServicePlayerBackend::Spotify(p) => p.pump_signals(),
            ServicePlayerBackend::YouTube(p) => p.pump_signals(),
        }
    }
}

/// Engines available to the application, one optional slot per backend.
#[derive(Default)]
pub struct PlayerEngines {
    pub normal: Option<Box<dyn AvQueueEngine>>,
    pub apple_music: Option<Box<dyn MusicCatalogEngine>>,
    pub spotify: Option<Box<dyn StreamingEngine>>,
    pub youtube: Option<Box<dyn VideoEmbedEngine>>,
}

impl PlayerEngines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normal(mut self, engine: impl AvQueueEngine + 'static) -> Self {
        self.normal = Some(Box::new(engine));
        self
    }

    pub fn with_apple_music(mut self, engine: impl MusicCatalogEngine + 'static) -> Self {
        self.apple_music = Some(Box::new(engine));
        self
    }

    pub fn with_spotify(mut self, engine: impl StreamingEngine + 'static) -> Self {
        self.spotify = Some(Box::new(engine));
        self
    }

    pub fn with_youtube(mut self, engine: impl VideoEmbedEngine + 'static) -> Self {
        self.youtube = Some(Box::new(engine));
        self
    }
}

/// Event re-published from a backend, tagged with its origin.
pub type BackendEvent = (PlayerType, ServicePlayerEvent);

/// One backend player per [`PlayerType`].
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: BTreeMap<PlayerType, ServicePlayerBackend>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a backend for every engine provided and enabled in `config`.
    pub fn from_engines(engines: PlayerEngines, config: &PlayerKitConfig) -> Self {
        let mut registry = Self::new();
        if let Some(engine) = engines.normal {
            registry.register_if_enabled(
                config,
                ServicePlayerBackend::Normal(NormalPlayer::new(engine, config.normal.clone())),
            );
        }
        if let Some(engine) = engines.apple_music {
            registry.register_if_enabled(
                config,
                ServicePlayerBackend::AppleMusic(AppleMusicPlayer::new(
                    engine,
                    config.apple_music.clone(),
                )),
            );
        }
        if let Some(engine) = engines.spotify {
            registry.register_if_enabled(
                config,
                ServicePlayerBackend::Spotify(SpotifyPlayer::new(engine)),
            );
        }
        if let Some(engine) = engines.youtube {
            registry.register_if_enabled(
                config,
                ServicePlayerBackend::YouTube(YouTubePlayer::new(engine, config.youtube.clone())),
            );
        }
        registry
    }

    fn register_if_enabled(&mut self, config: &PlayerKitConfig, backend: ServicePlayerBackend) {
        let player_type = backend.player_type();
        if config.is_enabled(player_type) {
            self.register(backend);
        } else {
            debug!(backend = %player_type, "Backend disabled by configuration");
        }
    }

    /// Adds `backend`, replacing any previous backend of the same type.
    pub fn register(&mut self, backend: ServicePlayerBackend) -> Option<ServicePlayerBackend> {
        let player_type = backend.player_type();
        info!(backend = %player_type, "Registered backend player");
        self.backends.insert(player_type, backend)
    }

    pub fn get(&self, player_type: PlayerType) -> Option<&ServicePlayerBackend> {
        self.backends.get(&player_type)
    }

    pub fn get_mut(&mut self, player_type: PlayerType) -> Option<&mut ServicePlayerBackend> {
        self.backends.get_mut(&player_type)
    }

    pub fn contains(&self, player_type: PlayerType) -> bool {
        self.backends.contains_key(&player_type)
    }

    pub fn types(&self) -> Vec<PlayerType> {
        self.backends.keys().copied().collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ServicePlayerBackend> {
        self.backends.values_mut()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Subscribes to every registered backend. Each event is delivered on
    /// the returned receiver tagged with its backend type.
    pub fn subscribe(&self) -> Receiver<BackendEvent> {
        let (tx, rx) = unbounded::<BackendEvent>();
        for (player_type, backend) in &self.backends {
            let tx = tx.clone();
            let player_type = *player_type;
            backend.add_observer(std::sync::Arc::new(move |event: &ServicePlayerEvent| {
                let _ = tx.send((player_type, event.clone()));
            }));
        }
        rx
    }
}
