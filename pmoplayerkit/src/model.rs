//! Value-level data model: backend tags, player lifecycle, tracks and
//! playlists.

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::PlayerKitError;

/// Closed set of playback backends. Every track names exactly one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerType {
    /// Local or HTTP media played through the native AV queue.
    Normal,
    /// Subscription catalog played through the music player controller.
    AppleMusic,
    /// Streaming SDK.
    Spotify,
    /// Embedded video player.
    #[serde(rename = "youtube")]
    YouTube,
}

impl PlayerType {
    pub const ALL: [PlayerType; 4] = [
        PlayerType::Normal,
        PlayerType::AppleMusic,
        PlayerType::Spotify,
        PlayerType::YouTube,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerType::Normal => "normal",
            PlayerType::AppleMusic => "apple_music",
            PlayerType::Spotify => "spotify",
            PlayerType::YouTube => "youtube",
        }
    }
}

impl fmt::Display for PlayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one backend player around one prepared track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlayerState {
    #[default]
    Init,
    /// Loading, not asked to play.
    Load,
    /// Asked to play before the engine was ready.
    LoadToPlay,
    Play,
    Pause,
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlayerState::LoadToPlay | PlayerState::Play)
    }
}

/// Transient position report computed on demand from the active backend.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayingInfo {
    pub duration: Duration,
    pub elapsed_time: Duration,
}

impl PlayingInfo {
    pub fn new(duration: Duration, elapsed_time: Duration) -> Self {
        Self {
            duration,
            elapsed_time,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed_time)
    }
}

/// Read-only descriptor of a playable item.
///
/// Only the title, the backend tag and the stream URL are required; the
/// per-backend identifiers default to `None`. A track is valid when it
/// carries the locator its backend needs to play it. Implementations may
/// override [`Track::is_valid`] to add their own conditions.
pub trait Track: fmt::Debug + Send + Sync {
    fn title(&self) -> Option<String>;
    fn player_type(&self) -> PlayerType;
    fn stream_url(&self) -> Option<String>;

    fn subtitle(&self) -> Option<String> {
        None
    }
    fn thumbnail_url(&self) -> Option<String> {
        None
    }
    fn artwork_url(&self) -> Option<String> {
        None
    }
    fn is_video(&self) -> bool {
        false
    }
    fn apple_music_id(&self) -> Option<String> {
        None
    }
    fn spotify_uri(&self) -> Option<String> {
        None
    }
    fn youtube_video_id(&self) -> Option<String> {
        None
    }

    /// The identifier the track's own backend loads.
    fn locator(&self) -> Option<String> {
        match self.player_type() {
            PlayerType::Normal => self.stream_url(),
            PlayerType::AppleMusic => self.apple_music_id(),
            PlayerType::Spotify => self.spotify_uri(),
            PlayerType::YouTube => self.youtube_video_id(),
        }
    }

    fn is_valid(&self) -> bool {
        self.locator().is_some()
    }
}

pub type TrackRef = Arc<dyn Track>;

/// Plain-data [`Track`] implementation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackInfo {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub thumbnail_url: Option<String>,
    pub artwork_url: Option<String>,
    pub is_video: bool,
    pub player_type: Option<PlayerType>,
    pub stream_url: Option<String>,
    pub apple_music_id: Option<String>,
    pub spotify_uri: Option<String>,
    pub youtube_video_id: Option<String>,
}

impl TrackInfo {
    fn titled(title: &str, player_type: PlayerType) -> Self {
        Self {
            title: Some(title.to_string()),
            player_type: Some(player_type),
            ..Default::default()
        }
    }

    /// Local file or HTTP stream. `None` yields an invalid track.
    pub fn stream(title: &str, url: Option<&str>) -> Self {
        Self {
            stream_url: url.map(str::to_string),
            ..Self::titled(title, PlayerType::Normal)
        }
    }

    pub fn apple_music(title: &str, catalog_id: Option<&str>) -> Self {
        Self {
            apple_music_id: catalog_id.map(str::to_string),
            ..Self::titled(title, PlayerType::AppleMusic)
        }
    }

    pub fn spotify(title: &str, uri: Option<&str>) -> Self {
        Self {
            spotify_uri: uri.map(str::to_string),
            ..Self::titled(title, PlayerType::Spotify)
        }
    }

    pub fn youtube(title: &str, video_id: Option<&str>) -> Self {
        Self {
            youtube_video_id: video_id.map(str::to_string),
            is_video: true,
            ..Self::titled(title, PlayerType::YouTube)
        }
    }

    pub fn with_subtitle(mut self, subtitle: &str) -> Self {
        self.subtitle = Some(subtitle.to_string());
        self
    }

    pub fn with_artwork(mut self, thumbnail_url: &str, artwork_url: &str) -> Self {
        self.thumbnail_url = Some(thumbnail_url.to_string());
        self.artwork_url = Some(artwork_url.to_string());
        self
    }

    pub fn into_ref(self) -> TrackRef {
        Arc::new(self)
    }
}

impl Track for TrackInfo {
    fn title(&self) -> Option<String> {
        self.title.clone()
    }
    fn player_type(&self) -> PlayerType {
        self.player_type.unwrap_or(PlayerType::Normal)
    }
    fn stream_url(&self) -> Option<String> {
        self.stream_url.clone()
    }
    fn subtitle(&self) -> Option<String> {
        self.subtitle.clone()
    }
    fn thumbnail_url(&self) -> Option<String> {
        self.thumbnail_url.clone()
    }
    fn artwork_url(&self) -> Option<String> {
        self.artwork_url.clone()
    }
    fn is_video(&self) -> bool {
        self.is_video
    }
    fn apple_music_id(&self) -> Option<String> {
        self.apple_music_id.clone()
    }
    fn spotify_uri(&self) -> Option<String> {
        self.spotify_uri.clone()
    }
    fn youtube_video_id(&self) -> Option<String> {
        self.youtube_video_id.clone()
    }
}

/// Ordered collection of tracks. Identity is the id, never the content.
pub trait Playlist: fmt::Debug + Send + Sync {
    fn id(&self) -> &str;
    fn tracks(&self) -> Vec<TrackRef>;

    fn track(&self, index: usize) -> Option<TrackRef> {
        self.tracks().get(index).cloned()
    }

    fn len(&self) -> usize {
        self.tracks().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn valid_tracks_count(&self) -> usize {
        self.tracks().iter().filter(|t| t.is_valid()).count()
    }
}

pub type PlaylistRef = Arc<dyn Playlist>;

/// In-memory playlist the application can grow while it is being played.
#[derive(Debug)]
pub struct MemoryPlaylist {
    id: String,
    tracks: RwLock<Vec<TrackRef>>,
}

impl MemoryPlaylist {
    pub fn new(id: &str, tracks: Vec<TrackRef>) -> Self {
        Self {
            id: id.to_string(),
            tracks: RwLock::new(tracks),
        }
    }

    pub fn shared(id: &str, tracks: Vec<TrackRef>) -> Arc<Self> {
        Arc::new(Self::new(id, tracks))
    }

    pub fn push(&self, track: TrackRef) {
        self.tracks
            .write()
            .expect("Playlist lock poisoned")
            .push(track);
    }

    /// Swaps the track at `index`, returning the previous one.
    pub fn replace_track(&self, index: usize, track: TrackRef) -> Result<TrackRef, PlayerKitError> {
        let mut tracks = self.tracks.write().expect("Playlist lock poisoned");
        let len = tracks.len();
        match tracks.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, track)),
            None => Err(PlayerKitError::Queue(format!(
                "Track index out of bound {} >= {} in playlist {}",
                index, len, self.id
            ))),
        }
    }
}

impl Playlist for MemoryPlaylist {
    fn id(&self) -> &str {
        &self.id
    }

    fn tracks(&self) -> Vec<TrackRef> {
        self.tracks.read().expect("Playlist lock poisoned").clone()
    }

    fn track(&self, index: usize) -> Option<TrackRef> {
        self.tracks
            .read()
            .expect("Playlist lock poisoned")
            .get(index)
            .cloned()
    }

    fn len(&self) -> usize {
        self.tracks.read().expect("Playlist lock poisoned").len()
    }
}
