// examples/queue_demo.rs
//
// Walks a two-playlist queue on a simulated AV engine:
//   - one broken track in the first playlist, skipped automatically
//   - the second playlist is enqueued when the player asks for more content
//   - optional start offset for the first track, e.g. "0:02" or "2"
//
// Run from the pmoplayerkit crate:
//   cargo run --example queue_demo
//   cargo run --example queue_demo -- 0:02
//   RUST_LOG=pmoplayerkit=trace cargo run --example queue_demo

use std::env;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use pmoplayerkit::service_player::{AvPlayerStatus, AvQueueEngine, AvQueueSignal, SignalSender};
use pmoplayerkit::time_utils::{parse_time_flexible, time_str, track_time_str};
use pmoplayerkit::{
    MemoryPlaylist, Observable, ObserverRef, PlayerEngines, PlayerKitConfig, PlayerKitError,
    Playlist, PlaylistQueue, PlaylistRef, QueuePlayer, QueuePlayerEvent, Track, TrackInfo,
};

/// Simulated seconds per loop iteration.
const STEP: Duration = Duration::from_secs(1);
const TRACK_LENGTH: Duration = Duration::from_secs(4);

#[derive(Default)]
struct SimulatedQueue {
    playing: bool,
    items: usize,
    time: Duration,
    signals: Option<SignalSender<AvQueueSignal>>,
}

/// AV engine whose clock only moves in `advance`.
#[derive(Clone, Default)]
struct SimulatedAvQueue(Arc<Mutex<SimulatedQueue>>);

impl SimulatedAvQueue {
    fn advance(&self, step: Duration) {
        let mut q = self.0.lock().unwrap();
        if !q.playing || q.items == 0 {
            return;
        }
        q.time += step;
        let Some(signals) = q.signals.clone() else {
            return;
        };
        signals.send(AvQueueSignal::PeriodicTime(q.time));
        if q.time >= TRACK_LENGTH {
            q.playing = false;
            signals.send(AvQueueSignal::DidPlayToEndTime);
        }
    }
}

impl AvQueueEngine for SimulatedAvQueue {
    fn load(
        &mut self,
        url: &str,
        _time_interval: Duration,
        signals: SignalSender<AvQueueSignal>,
    ) -> Result<(), PlayerKitError> {
        println!("  [engine] load {url}");
        let mut q = self.0.lock().unwrap();
        q.items = 1;
        q.time = Duration::ZERO;
        signals.send(AvQueueSignal::StatusChanged);
        q.signals = Some(signals);
        Ok(())
    }

    fn status(&self) -> AvPlayerStatus {
        AvPlayerStatus::ReadyToPlay
    }

    fn item_count(&self) -> usize {
        self.0.lock().unwrap().items
    }

    fn remove_current_item(&mut self) {
        self.0.lock().unwrap().items = 0;
    }

    fn play(&mut self) {
        self.0.lock().unwrap().playing = true;
    }

    fn pause(&mut self) {
        self.0.lock().unwrap().playing = false;
    }

    fn seek(&mut self, time: Duration, _timescale: i32) {
        self.0.lock().unwrap().time = time;
    }

    fn duration(&self) -> Option<Duration> {
        (self.0.lock().unwrap().items > 0).then_some(TRACK_LENGTH)
    }

    fn current_time(&self) -> Option<Duration> {
        let q = self.0.lock().unwrap();
        (q.items > 0).then_some(q.time)
    }

    fn teardown(&mut self) {
        let mut q = self.0.lock().unwrap();
        q.playing = false;
        q.items = 0;
        q.signals = None;
    }
}

fn track(title: &str) -> pmoplayerkit::TrackRef {
    let url = format!("http://media.local/{title}.flac");
    TrackInfo::stream(title, Some(url.as_str())).into_ref()
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pmoplayerkit=debug,info")),
        )
        .try_init();

    let start_at = match env::args().nth(1) {
        Some(arg) => Some(parse_time_flexible(&arg)?),
        None => None,
    };

    let config = PlayerKitConfig::load(None)?;
    let engine = SimulatedAvQueue::default();
    let player = QueuePlayer::with_engines(PlayerEngines::new().with_normal(engine.clone()), &config);

    let first: PlaylistRef = MemoryPlaylist::shared(
        "morning",
        vec![
            track("intro"),
            TrackInfo::stream("missing", None).into_ref(),
            track("theme"),
        ],
    );
    let encore: PlaylistRef = MemoryPlaylist::shared("encore", vec![track("finale")]);
    let queue = PlaylistQueue::shared(vec![first.clone()]);

    let done = Arc::new(Mutex::new(false));
    let observer: ObserverRef<QueuePlayerEvent> = {
        let queue = queue.clone();
        let done = done.clone();
        let encore = Mutex::new(Some(encore));
        Arc::new(move |event: &QueuePlayerEvent| match event {
            QueuePlayerEvent::TrackSelected { track, index, playlist } => println!(
                "> selected {}:{} {}",
                playlist.id(),
                index,
                track.title().unwrap_or_default()
            ),
            QueuePlayerEvent::StatusChanged(state) => println!("  state {state:?}"),
            QueuePlayerEvent::NextPlaylistRequested => {
                match encore.lock().unwrap().take() {
                    Some(playlist) => {
                        println!("> enqueue {}", playlist.id());
                        queue.enqueue(playlist);
                        if let Some(player) = queue.player() {
                            player.next();
                        }
                    }
                    None => *done.lock().unwrap() = true,
                }
            }
            QueuePlayerEvent::ErrorOccured { backend, message } => {
                eprintln!("! {backend}: {message}")
            }
            _ => {}
        })
    };
    player.add_observer(observer);

    player.play_at(0, &first, &queue);
    if let Some(offset) = start_at {
        println!("> seek to {}", time_str(offset.as_secs_f64()));
        player.seek_to_time(offset);
    }

    while !*done.lock().unwrap() {
        thread::sleep(Duration::from_millis(250));
        engine.advance(STEP);
        player.process_events();
        if let Some(info) = player.playing_info() {
            println!("  {}", track_time_str(info.elapsed_time, info.duration));
        }
    }

    println!("Queue finished.");
    Ok(())
}
