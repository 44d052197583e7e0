#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pmoplayerkit::config::YouTubePlayerConfig;
use pmoplayerkit::service_player::{
    AvPlayerStatus, AvQueueEngine, AvQueueSignal, CatalogPlaybackState, CatalogSignal,
    MusicCatalogEngine, SignalSender, StreamingEngine, StreamingSignal, VideoEmbedEngine,
    VideoPlayerState, VideoSignal,
};
use pmoplayerkit::{
    MemoryPlaylist, Observable, ObserverRef, PlayerEngines, PlayerKitConfig, PlayerKitError,
    PlayerType, PlaylistQueue, PlaylistRef, QueuePlayer, QueuePlayerEvent, Track, TrackInfo,
    TrackRef,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// ---------------------------------------------------------------------------
// AV queue
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AvQueueState {
    pub status: AvPlayerStatus,
    /// Status reported right after a load.
    pub status_on_load: AvPlayerStatus,
    pub fail_load: bool,
    pub items: usize,
    pub playing: bool,
    pub time: Duration,
    pub duration: Duration,
    pub loads: Vec<String>,
    pub seeks: Vec<(Duration, i32)>,
    pub teardowns: usize,
    pub signals: Option<SignalSender<AvQueueSignal>>,
}

impl Default for AvQueueState {
    fn default() -> Self {
        Self {
            status: AvPlayerStatus::Unknown,
            status_on_load: AvPlayerStatus::ReadyToPlay,
            fail_load: false,
            items: 0,
            playing: false,
            time: Duration::ZERO,
            duration: Duration::from_secs(180),
            loads: Vec::new(),
            seeks: Vec::new(),
            teardowns: 0,
            signals: None,
        }
    }
}

pub type AvQueueHandle = Arc<Mutex<AvQueueState>>;

pub struct FakeAvQueue(pub AvQueueHandle);

impl AvQueueEngine for FakeAvQueue {
    fn load(
        &mut self,
        url: &str,
        _time_interval: Duration,
        signals: SignalSender<AvQueueSignal>,
    ) -> Result<(), PlayerKitError> {
        let mut s = self.0.lock().unwrap();
        if s.fail_load {
            return Err(PlayerKitError::engine_error(PlayerType::Normal, "cannot open item"));
        }
        s.loads.push(url.to_string());
        s.items = 1;
        s.time = Duration::ZERO;
        s.status = s.status_on_load;
        s.signals = Some(signals);
        Ok(())
    }
    fn status(&self) -> AvPlayerStatus {
        self.0.lock().unwrap().status
    }
    fn item_count(&self) -> usize {
        self.0.lock().unwrap().items
    }
    fn remove_current_item(&mut self) {
        let mut s = self.0.lock().unwrap();
        s.items = s.items.saturating_sub(1);
    }
    fn play(&mut self) {
        self.0.lock().unwrap().playing = true;
    }
    fn pause(&mut self) {
        self.0.lock().unwrap().playing = false;
    }
    fn seek(&mut self, time: Duration, timescale: i32) {
        let mut s = self.0.lock().unwrap();
        s.time = time;
        s.seeks.push((time, timescale));
    }
    fn duration(&self) -> Option<Duration> {
        let s = self.0.lock().unwrap();
        (s.items > 0).then_some(s.duration)
    }
    fn current_time(&self) -> Option<Duration> {
        let s = self.0.lock().unwrap();
        (s.items > 0).then_some(s.time)
    }
    fn teardown(&mut self) {
        let mut s = self.0.lock().unwrap();
        s.playing = false;
        s.items = 0;
        s.teardowns += 1;
        s.signals = None;
    }
}

/// Sends `signal` through the sender the engine was last given.
pub fn av_signal(handle: &AvQueueHandle, signal: AvQueueSignal) -> bool {
    let sender = handle.lock().unwrap().signals.clone();
    sender.is_some_and(|s| s.send(signal))
}

// ---------------------------------------------------------------------------
// Music catalog
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct CatalogState {
    pub queue: Option<String>,
    pub prepared: bool,
    pub prepare_requests: usize,
    pub play_calls: usize,
    pub pause_calls: usize,
    pub playback_state: CatalogPlaybackState,
    pub now_playing: Option<Duration>,
    pub time: Duration,
    pub signals: Option<SignalSender<CatalogSignal>>,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self {
            queue: None,
            prepared: false,
            prepare_requests: 0,
            play_calls: 0,
            pause_calls: 0,
            playback_state: CatalogPlaybackState::Stopped,
            now_playing: None,
            time: Duration::ZERO,
            signals: None,
        }
    }
}

pub type CatalogHandle = Arc<Mutex<CatalogState>>;

pub struct FakeCatalog(pub CatalogHandle);

impl MusicCatalogEngine for FakeCatalog {
    fn set_queue(
        &mut self,
        store_id: &str,
        signals: SignalSender<CatalogSignal>,
    ) -> Result<(), PlayerKitError> {
        let mut s = self.0.lock().unwrap();
        s.queue = Some(store_id.to_string());
        s.now_playing = Some(Duration::from_secs(240));
        s.signals = Some(signals);
        Ok(())
    }
    fn is_prepared_to_play(&self) -> bool {
        self.0.lock().unwrap().prepared
    }
    fn prepare_to_play(&mut self) {
        self.0.lock().unwrap().prepare_requests += 1;
    }
    fn play(&mut self) {
        self.0.lock().unwrap().play_calls += 1;
    }
    fn pause(&mut self) {
        self.0.lock().unwrap().pause_calls += 1;
    }
    fn playback_state(&self) -> CatalogPlaybackState {
        self.0.lock().unwrap().playback_state
    }
    fn now_playing_duration(&self) -> Option<Duration> {
        self.0.lock().unwrap().now_playing
    }
    fn current_playback_time(&self) -> Duration {
        self.0.lock().unwrap().time
    }
    fn set_current_playback_time(&mut self, time: Duration) {
        self.0.lock().unwrap().time = time;
    }
}

pub fn catalog_signal(handle: &CatalogHandle, signal: CatalogSignal) -> bool {
    let sender = handle.lock().unwrap().signals.clone();
    sender.is_some_and(|s| s.send(signal))
}

// ---------------------------------------------------------------------------
// Streaming SDK
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct StreamingState {
    pub logged_in: bool,
    pub attached: bool,
    pub uris: Vec<String>,
    /// Every `set_is_playing` argument, in order.
    pub playing_requests: Vec<bool>,
    pub seeks: Vec<Duration>,
    pub position: Duration,
    pub signals: Option<SignalSender<StreamingSignal>>,
}

impl Default for StreamingState {
    fn default() -> Self {
        Self {
            logged_in: true,
            attached: false,
            uris: Vec::new(),
            playing_requests: Vec::new(),
            seeks: Vec::new(),
            position: Duration::ZERO,
            signals: None,
        }
    }
}

pub type StreamingHandle = Arc<Mutex<StreamingState>>;

pub struct FakeStreaming(pub StreamingHandle);

impl StreamingEngine for FakeStreaming {
    fn is_logged_in(&self) -> bool {
        self.0.lock().unwrap().logged_in
    }
    fn attach(&mut self, signals: SignalSender<StreamingSignal>) {
        let mut s = self.0.lock().unwrap();
        s.attached = true;
        s.signals = Some(signals);
    }
    fn detach(&mut self) {
        let mut s = self.0.lock().unwrap();
        s.attached = false;
        s.signals = None;
    }
    fn play_uri(&mut self, uri: &str) {
        self.0.lock().unwrap().uris.push(uri.to_string());
    }
    fn set_is_playing(&mut self, playing: bool) {
        self.0.lock().unwrap().playing_requests.push(playing);
    }
    fn seek(&mut self, position: Duration) {
        let mut s = self.0.lock().unwrap();
        s.position = position;
        s.seeks.push(position);
    }
    fn current_track_duration(&self) -> Option<Duration> {
        let s = self.0.lock().unwrap();
        (!s.uris.is_empty()).then_some(Duration::from_secs(200))
    }
    fn position(&self) -> Duration {
        self.0.lock().unwrap().position
    }
}

pub fn streaming_signal(handle: &StreamingHandle, signal: StreamingSignal) -> bool {
    let sender = handle.lock().unwrap().signals.clone();
    sender.is_some_and(|s| s.send(signal))
}

// ---------------------------------------------------------------------------
// Video embed
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct VideoState {
    pub player_state: VideoPlayerState,
    pub loads: Vec<(String, usize)>,
    pub cues: Vec<String>,
    pub playing: bool,
    pub play_calls: usize,
    pub seeks: Vec<Duration>,
    pub signals: Option<SignalSender<VideoSignal>>,
}

impl Default for VideoState {
    fn default() -> Self {
        Self {
            player_state: VideoPlayerState::Unknown,
            loads: Vec::new(),
            cues: Vec::new(),
            playing: false,
            play_calls: 0,
            seeks: Vec::new(),
            signals: None,
        }
    }
}

pub type VideoHandle = Arc<Mutex<VideoState>>;

pub struct FakeVideo(pub VideoHandle);

impl VideoEmbedEngine for FakeVideo {
    fn attach(&mut self, signals: SignalSender<VideoSignal>) {
        self.0.lock().unwrap().signals = Some(signals);
    }
    fn detach(&mut self) {
        self.0.lock().unwrap().signals = None;
    }
    fn player_state(&self) -> VideoPlayerState {
        self.0.lock().unwrap().player_state
    }
    fn load(&mut self, video_id: &str, config: &YouTubePlayerConfig) -> Result<(), PlayerKitError> {
        let mut s = self.0.lock().unwrap();
        s.loads.push((video_id.to_string(), config.player_vars.len()));
        s.player_state = VideoPlayerState::Unstarted;
        Ok(())
    }
    fn cue(&mut self, video_id: &str, _start: Duration) -> Result<(), PlayerKitError> {
        let mut s = self.0.lock().unwrap();
        s.cues.push(video_id.to_string());
        s.player_state = VideoPlayerState::Queued;
        Ok(())
    }
    fn play_video(&mut self) {
        let mut s = self.0.lock().unwrap();
        s.playing = true;
        s.play_calls += 1;
    }
    fn pause_video(&mut self) {
        self.0.lock().unwrap().playing = false;
    }
    fn seek(&mut self, to: Duration, _allow_seek_ahead: bool) {
        self.0.lock().unwrap().seeks.push(to);
    }
    fn duration(&self) -> Duration {
        Duration::from_secs(300)
    }
    fn current_time(&self) -> Duration {
        self.0
            .lock()
            .unwrap()
            .seeks
            .last()
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

pub fn video_signal(handle: &VideoHandle, signal: VideoSignal) -> bool {
    let sender = handle.lock().unwrap().signals.clone();
    sender.is_some_and(|s| s.send(signal))
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

/// Queue player over the four fake engines, with an event recorder.
pub struct Fixture {
    pub player: QueuePlayer,
    pub events: EventLog,
    pub av: AvQueueHandle,
    pub catalog: CatalogHandle,
    pub streaming: StreamingHandle,
    pub video: VideoHandle,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(&test_config())
    }

    pub fn with_config(config: &PlayerKitConfig) -> Self {
        init_tracing();
        let av = AvQueueHandle::default();
        let catalog = CatalogHandle::default();
        let streaming = StreamingHandle::default();
        let video = VideoHandle::default();

        let engines = PlayerEngines::new()
            .with_normal(FakeAvQueue(av.clone()))
            .with_apple_music(FakeCatalog(catalog.clone()))
            .with_spotify(FakeStreaming(streaming.clone()))
            .with_youtube(FakeVideo(video.clone()));
        let player = QueuePlayer::with_engines(engines, config);
        let events = EventLog::attach(&player);

        Self {
            player,
            events,
            av,
            catalog,
            streaming,
            video,
        }
    }
}

/// Configuration with the catalog state sync applied on the next pump.
pub fn test_config() -> PlayerKitConfig {
    PlayerKitConfig::from_yaml_str("apple_music:\n  state_sync_delay_ms: 0\n")
        .expect("test configuration")
}

/// Records every queue player event.
#[derive(Clone)]
pub struct EventLog {
    events: Arc<Mutex<Vec<QueuePlayerEvent>>>,
    observer: ObserverRef<QueuePlayerEvent>,
}

impl EventLog {
    pub fn attach(player: &QueuePlayer) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let observer: ObserverRef<QueuePlayerEvent> =
            Arc::new(move |e: &QueuePlayerEvent| sink.lock().unwrap().push(e.clone()));
        player.add_observer(observer.clone());
        Self { events, observer }
    }

    pub fn observer(&self) -> &ObserverRef<QueuePlayerEvent> {
        &self.observer
    }

    pub fn all(&self) -> Vec<QueuePlayerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&QueuePlayerEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    pub fn selected(&self) -> usize {
        self.count(|e| matches!(e, QueuePlayerEvent::TrackSelected { .. }))
    }

    pub fn unselected(&self) -> usize {
        self.count(|e| matches!(e, QueuePlayerEvent::TrackUnselected { .. }))
    }

    pub fn next_requested(&self) -> usize {
        self.count(|e| matches!(e, QueuePlayerEvent::NextPlaylistRequested))
    }

    pub fn previous_requested(&self) -> usize {
        self.count(|e| matches!(e, QueuePlayerEvent::PreviousPlaylistRequested))
    }

    pub fn time_updates(&self) -> usize {
        self.count(|e| matches!(e, QueuePlayerEvent::TimeUpdated))
    }

    pub fn ended(&self) -> usize {
        self.count(|e| matches!(e, QueuePlayerEvent::DidPlayToEndTime))
    }

    pub fn errors(&self) -> usize {
        self.count(|e| matches!(e, QueuePlayerEvent::ErrorOccured { .. }))
    }

    pub fn status_changes(&self) -> usize {
        self.count(|e| matches!(e, QueuePlayerEvent::StatusChanged(_)))
    }
}

// ---------------------------------------------------------------------------
// Content helpers
// ---------------------------------------------------------------------------

pub fn stream(title: &str) -> TrackRef {
    let url = format!("http://media.local/{title}.mp3");
    TrackInfo::stream(title, Some(url.as_str())).into_ref()
}

pub fn broken(title: &str) -> TrackRef {
    TrackInfo::stream(title, None).into_ref()
}

pub fn catalog(title: &str, id: &str) -> TrackRef {
    TrackInfo::apple_music(title, Some(id)).into_ref()
}

pub fn spotify(title: &str, uri: &str) -> TrackRef {
    TrackInfo::spotify(title, Some(uri)).into_ref()
}

pub fn video(title: &str, id: &str) -> TrackRef {
    TrackInfo::youtube(title, Some(id)).into_ref()
}

pub fn playlist(id: &str, tracks: Vec<TrackRef>) -> PlaylistRef {
    Arc::new(MemoryPlaylist::new(id, tracks))
}

pub fn queue(playlists: &[PlaylistRef]) -> Arc<PlaylistQueue> {
    PlaylistQueue::shared(playlists.to_vec())
}

pub fn title_of(track: Option<TrackRef>) -> Option<String> {
    track.and_then(|t| t.title())
}
