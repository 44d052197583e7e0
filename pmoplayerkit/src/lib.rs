//! Multi-backend playback orchestration.
//!
//! A [`QueuePlayer`] walks a [`PlaylistQueue`] and routes transport commands
//! to the backend player owning the current track's [`PlayerType`]: local
//! and HTTP media, a subscription catalog, a streaming SDK, or an embedded
//! video player. Backend events are republished as one
//! [`QueuePlayerEvent`] stream so that observers stay backend-agnostic.

pub mod config;
pub mod errors;
pub mod model;
pub mod observable;
pub mod playlist_queue;
pub mod position;
pub mod queue_player;
pub mod service_player;
pub mod time_utils;
pub mod track_list;

pub use config::PlayerKitConfig;
pub use errors::{CatalogErrorCode, PlayerKitError};
pub use model::{
    MemoryPlaylist, PlayerState, PlayerType, PlayingInfo, Playlist, PlaylistRef, Track, TrackInfo,
    TrackRef,
};
pub use observable::{Observable, Observer, ObserverList, ObserverRef};
pub use playlist_queue::PlaylistQueue;
pub use position::Position;
pub use queue_player::{QueuePlayer, QueuePlayerEvent};
pub use service_player::{
    BackendRegistry, PlayerEngines, ServicePlayer, ServicePlayerBackend, ServicePlayerEvent,
};
pub use track_list::TrackList;
