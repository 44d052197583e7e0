mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::*;
use pmoplayerkit::service_player::{AvQueueSignal, CatalogSignal, StreamingSignal};
use pmoplayerkit::{
    CatalogErrorCode, MemoryPlaylist, Observable, ObserverRef, PlayerState, PlayerType, Playlist,
    PlaylistRef, Position, QueuePlayerEvent, Track,
};

#[test]
fn test_play_then_next_skips_invalid_track_and_requests_more() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a"), broken("b"), stream("c")]);
    let q = queue(&[p1.clone()]);

    assert!(fx.player.play_at(0, &p1, &q));
    assert_eq!(fx.player.current_state(), PlayerState::Play);
    assert_eq!(title_of(fx.player.current_track()).as_deref(), Some("a"));

    assert!(fx.player.next());
    assert_eq!(title_of(fx.player.current_track()).as_deref(), Some("c"));
    assert_eq!(fx.player.current_track_index(), Some(2));
    assert!(fx.player.current_state().is_playing());

    assert!(!fx.player.next());
    assert_eq!(fx.events.next_requested(), 1);
    assert_eq!(fx.player.current_position(), Some(Position::new(0, 2)));
}

#[test]
fn test_next_skips_playlist_without_valid_tracks() {
    let fx = Fixture::new();
    let first = playlist("first", vec![stream("a")]);
    let dead = playlist("dead", vec![broken("x"), broken("y")]);
    let last = playlist("last", vec![broken("z"), stream("b")]);
    let q = queue(&[first.clone(), dead, last]);

    assert!(fx.player.select(0, &first, &q));
    assert!(fx.player.next());
    assert_eq!(fx.player.current_position(), Some(Position::new(2, 1)));
    assert_eq!(
        fx.player.current_playlist().map(|p| p.id().to_string()),
        Some("last".to_string())
    );
    // Was not playing, stays prepared only.
    assert!(!fx.player.current_state().is_playing());
}

#[test]
fn test_play_twice_fires_track_selected_once() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a"), stream("b")]);
    let q = queue(&[p1.clone()]);

    assert!(fx.player.play_at(1, &p1, &q));
    assert!(fx.player.play_at(1, &p1, &q));

    assert_eq!(fx.events.selected(), 1);
    assert_eq!(fx.events.unselected(), 0);
    assert_eq!(fx.av.lock().unwrap().loads.len(), 1);
    assert_eq!(fx.player.current_state(), PlayerState::Play);
}

#[test]
fn test_equal_queue_instance_is_treated_as_current() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a")]);
    let q1 = queue(&[p1.clone()]);
    let q2 = queue(&[p1.clone()]);

    assert!(fx.player.select(0, &p1, &q1));
    assert!(fx.player.select(0, &p1, &q2));

    assert_eq!(fx.events.selected(), 1);
    // The back-reference follows the adopted instance.
    assert!(q1.player().is_none());
    assert!(q2.player().is_some());
}

#[test]
fn test_selecting_invalid_track_changes_nothing() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a"), broken("b")]);
    let q = queue(&[p1.clone()]);

    assert!(!fx.player.select(1, &p1, &q));
    assert!(fx.player.current_track().is_none());
    assert!(fx.events.all().is_empty());
    assert!(q.player().is_none());

    assert!(fx.player.play_at(0, &p1, &q));
    let before = fx.events.all().len();
    assert!(!fx.player.play_at(1, &p1, &q));
    assert!(!fx.player.toggle_at(7, &p1, &q));
    assert_eq!(title_of(fx.player.current_track()).as_deref(), Some("a"));
    assert_eq!(fx.events.all().len(), before);
}

#[test]
fn test_playlist_outside_queue_is_rejected() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a")]);
    let stray = playlist("stray", vec![stream("b")]);
    let q = queue(&[p1]);

    assert!(!fx.player.play_at(0, &stray, &q));
    assert!(fx.player.current_position().is_none());
}

#[test]
fn test_selection_change_reports_unselected_then_selected() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a"), stream("b")]);
    let q = queue(&[p1.clone()]);

    fx.player.select(0, &p1, &q);
    fx.events.clear();
    fx.player.select(1, &p1, &q);

    let events = fx.events.all();
    let unselected = events
        .iter()
        .position(|e| matches!(e, QueuePlayerEvent::TrackUnselected { index: 0, .. }))
        .expect("unselected event");
    let selected = events
        .iter()
        .position(|e| matches!(e, QueuePlayerEvent::TrackSelected { index: 1, .. }))
        .expect("selected event");
    assert!(unselected < selected);

    match &events[selected] {
        QueuePlayerEvent::TrackSelected { track, playlist, .. } => {
            assert_eq!(track.title().as_deref(), Some("b"));
            assert_eq!(playlist.id(), "p1");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_toggle_alternates_once_prepared() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a")]);
    let q = queue(&[p1.clone()]);

    // Nothing selected: no-op.
    fx.player.toggle();
    assert_eq!(fx.player.current_state(), PlayerState::Init);

    assert!(fx.player.select(0, &p1, &q));
    assert!(!fx.player.current_state().is_playing());

    let mut expected_playing = true;
    for _ in 0..6 {
        fx.player.toggle();
        assert_eq!(fx.player.current_state().is_playing(), expected_playing);
        expected_playing = !expected_playing;
    }
}

#[test]
fn test_toggle_at_current_track_pauses_and_resumes() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a"), stream("b")]);
    let q = queue(&[p1.clone()]);

    assert!(fx.player.toggle_at(0, &p1, &q));
    assert_eq!(fx.player.current_state(), PlayerState::Play);
    assert!(fx.player.toggle_at(0, &p1, &q));
    assert_eq!(fx.player.current_state(), PlayerState::Pause);
    assert!(fx.player.toggle_at(1, &p1, &q));
    assert_eq!(fx.player.current_state(), PlayerState::Play);
    assert_eq!(fx.player.current_track_index(), Some(1));
}

#[test]
fn test_next_then_previous_returns_to_start_within_playlist() {
    let fx = Fixture::new();
    let p1 = playlist(
        "p1",
        vec![stream("a"), stream("b"), broken("x"), stream("c"), stream("d")],
    );
    let q = queue(&[p1.clone()]);

    for start in [0usize, 1, 3] {
        assert!(fx.player.play_at(start, &p1, &q));
        assert!(fx.player.next());
        assert!(fx.player.previous());
        assert_eq!(fx.player.current_track_index(), Some(start));
        assert!(fx.player.current_state().is_playing());
    }
}

#[test]
fn test_previous_at_start_requests_previous_playlist() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![broken("x"), stream("a")]);
    let q = queue(&[p1.clone()]);

    fx.player.select(1, &p1, &q);
    assert!(!fx.player.previous());
    assert_eq!(fx.events.previous_requested(), 1);
    assert_eq!(fx.player.current_track_index(), Some(1));
}

#[test]
fn test_next_without_selection_does_nothing() {
    let fx = Fixture::new();
    assert!(!fx.player.next());
    assert!(!fx.player.previous());
    assert!(fx.events.all().is_empty());
}

#[test]
fn test_end_of_track_advances_and_plays() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a"), broken("b")]);
    let p2 = playlist("p2", vec![stream("c")]);
    let q = queue(&[p1.clone(), p2]);

    assert!(fx.player.select(0, &p1, &q));
    assert!(av_signal(&fx.av, AvQueueSignal::DidPlayToEndTime));
    fx.player.process_events();

    assert_eq!(fx.events.ended(), 1);
    assert_eq!(fx.player.current_position(), Some(Position::new(1, 0)));
    assert_eq!(fx.player.current_state(), PlayerState::Play);
    assert_eq!(fx.events.next_requested(), 0);
}

#[test]
fn test_end_of_last_track_requests_next_playlist_once() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a"), broken("b")]);
    let q = queue(&[p1.clone()]);

    assert!(fx.player.play_at(0, &p1, &q));
    assert!(av_signal(&fx.av, AvQueueSignal::DidPlayToEndTime));
    fx.player.process_events();

    assert_eq!(fx.events.ended(), 1);
    assert_eq!(fx.events.next_requested(), 1);
    assert_eq!(fx.player.current_position(), Some(Position::new(0, 0)));
}

#[test]
fn test_more_content_enqueued_from_observer() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a")]);
    let q = queue(&[p1.clone()]);
    let extra = playlist("extra", vec![stream("b")]);

    let seen_index = Arc::new(Mutex::new(None));
    let sink = seen_index.clone();
    let q_for_observer = q.clone();
    let observer: ObserverRef<QueuePlayerEvent> = Arc::new(move |e: &QueuePlayerEvent| {
        if matches!(e, QueuePlayerEvent::NextPlaylistRequested) {
            q_for_observer.enqueue(extra.clone());
            // Calling back into the player from an observer must not block.
            *sink.lock().unwrap() = q_for_observer
                .player()
                .and_then(|p| p.current_track_index());
        }
    });
    fx.player.add_observer(observer);

    fx.player.play_at(0, &p1, &q);
    assert!(!fx.player.next());
    assert_eq!(*seen_index.lock().unwrap(), Some(0));

    assert!(fx.player.next());
    assert_eq!(fx.player.current_position(), Some(Position::new(1, 0)));
}

#[test]
fn test_seek_republishes_time_once() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a")]);
    let q = queue(&[p1.clone()]);

    fx.player.play_at(0, &p1, &q);
    fx.events.clear();
    fx.player.seek_to_time(Duration::from_secs(30));

    assert_eq!(fx.events.time_updates(), 1);
    assert_eq!(
        fx.av.lock().unwrap().seeks,
        vec![(Duration::from_secs(30), 1000)]
    );
    let info = fx.player.playing_info().unwrap();
    assert_eq!(info.elapsed_time, Duration::from_secs(30));
    assert_eq!(info.duration, Duration::from_secs(180));
}

#[test]
fn test_track_updated_announces_next_track() {
    let fx = Fixture::new();
    let lazy = MemoryPlaylist::shared("lazy", vec![stream("a"), broken("b")]);
    let p1: PlaylistRef = lazy.clone();
    let q = queue(&[p1.clone()]);

    fx.player.play_at(0, &p1, &q);
    assert!(fx.player.next_track().is_none());

    // Unrelated track: nothing happens.
    q.track_updated(&stream("zzz"));
    let resolved = stream("b");
    lazy.replace_track(1, resolved.clone()).unwrap();
    q.track_updated(&resolved);

    assert_eq!(
        fx.events
            .count(|e| matches!(e, QueuePlayerEvent::NextTrackAdded)),
        1
    );
    assert_eq!(title_of(fx.player.next_track()).as_deref(), Some("b"));

    // A queue the player does not own never notifies.
    let other = queue(&[p1.clone()]);
    other.track_updated(&resolved);
    assert_eq!(
        fx.events
            .count(|e| matches!(e, QueuePlayerEvent::NextTrackAdded)),
        1
    );
}

#[test]
fn test_queue_back_reference_follows_adoption_and_lifetime() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a")]);
    let p2 = playlist("p2", vec![stream("b")]);
    let q1 = queue(&[p1.clone()]);
    let q2 = queue(&[p2.clone()]);

    fx.player.select(0, &p1, &q1);
    assert!(q1.player().is_some());

    fx.player.select(0, &p2, &q2);
    assert!(q1.player().is_none());
    assert!(q2.player().is_some());
    assert_eq!(*fx.player.playlist_queue().unwrap(), *q2);

    let Fixture { player, events, .. } = fx;
    drop(events);
    drop(player);
    assert!(q2.player().is_none());
}

#[test]
fn test_backends_are_routed_by_track_type() {
    let fx = Fixture::new();
    let mixed = playlist(
        "mixed",
        vec![
            stream("a"),
            spotify("s", "spotify:track:1"),
            video("v", "dQw4w9WgXcQ"),
        ],
    );
    let q = queue(&[mixed.clone()]);

    assert!(fx.player.play_at(0, &mixed, &q));
    assert_eq!(fx.player.active_backend(), Some(PlayerType::Normal));

    assert!(fx.player.next());
    assert_eq!(fx.player.active_backend(), Some(PlayerType::Spotify));
    assert_eq!(fx.player.backend_state(PlayerType::Normal), Some(PlayerState::Init));
    assert_eq!(fx.player.current_state(), PlayerState::LoadToPlay);
    assert_eq!(fx.streaming.lock().unwrap().uris, vec!["spotify:track:1"]);

    assert!(streaming_signal(
        &fx.streaming,
        StreamingSignal::PositionChanged(Duration::from_secs(1))
    ));
    fx.player.process_events();
    assert_eq!(fx.player.current_state(), PlayerState::Play);

    assert!(fx.player.next());
    assert_eq!(fx.player.active_backend(), Some(PlayerType::YouTube));
    assert_eq!(fx.player.backend_state(PlayerType::Spotify), Some(PlayerState::Init));
    assert_eq!(fx.player.current_state(), PlayerState::Play);
    assert_eq!(fx.video.lock().unwrap().loads.len(), 1);
}

#[test]
fn test_signals_from_cleared_attempt_are_dropped() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a"), stream("b")]);
    let q = queue(&[p1.clone()]);

    fx.player.play_at(0, &p1, &q);
    let stale = fx.av.lock().unwrap().signals.clone().unwrap();
    fx.player.next();

    assert!(!stale.send(AvQueueSignal::DidPlayToEndTime));
    fx.player.process_events();
    assert_eq!(fx.events.ended(), 0);
    assert_eq!(fx.player.current_track_index(), Some(1));
}

#[test]
fn test_unplayable_catalog_item_is_skipped() {
    let fx = Fixture::new();
    let albums = playlist(
        "albums",
        vec![catalog("m1", "1001"), catalog("m2", "1002")],
    );
    let q = queue(&[albums.clone()]);

    assert!(fx.player.play_at(0, &albums, &q));
    assert_eq!(fx.player.current_state(), PlayerState::LoadToPlay);

    assert!(catalog_signal(
        &fx.catalog,
        CatalogSignal::PrepareCompleted(Err(CatalogErrorCode::NotFound))
    ));
    fx.player.process_events();

    assert_eq!(fx.events.ended(), 1);
    assert_eq!(fx.events.errors(), 0);
    assert_eq!(fx.player.current_track_index(), Some(1));
    assert_eq!(fx.catalog.lock().unwrap().queue.as_deref(), Some("1002"));

    assert!(catalog_signal(
        &fx.catalog,
        CatalogSignal::PrepareCompleted(Err(CatalogErrorCode::NetworkConnectionFailed))
    ));
    fx.player.process_events();
    assert_eq!(fx.events.errors(), 1);
    assert_eq!(fx.player.current_track_index(), Some(1));
}

#[test]
fn test_disabled_backend_tracks_are_skipped() {
    let config = pmoplayerkit::PlayerKitConfig::from_yaml_str("enabled_backends: [normal]\n").unwrap();
    let fx = Fixture::with_config(&config);
    let mixed = playlist(
        "mixed",
        vec![stream("a"), spotify("s", "spotify:track:1"), stream("b")],
    );
    let q = queue(&[mixed.clone()]);

    assert_eq!(fx.player.backend_types(), vec![PlayerType::Normal]);
    assert!(!fx.player.select(1, &mixed, &q));
    assert!(fx.player.select(0, &mixed, &q));
    assert!(fx.player.next());
    assert_eq!(fx.player.current_track_index(), Some(2));
}

#[test]
fn test_current_track_list_is_same_backend_run() {
    let fx = Fixture::new();
    let mixed = playlist(
        "mixed",
        vec![
            stream("a"),
            catalog("m1", "1"),
            catalog("m2", "2"),
            stream("b"),
        ],
    );
    let q = queue(&[mixed.clone()]);

    fx.player.select(2, &mixed, &q);
    let run = fx.player.current_track_list().unwrap();
    assert_eq!(run.id, "mixed:apple_music:1");
    assert_eq!(run.len(), 2);
    assert_eq!(title_of(fx.player.previous_track()).as_deref(), Some("m1"));
    assert_eq!(title_of(fx.player.next_track()).as_deref(), Some("b"));
}

#[test]
fn test_removing_observer_drops_one_registration() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a"), stream("b")]);
    let q = queue(&[p1.clone()]);

    fx.player.add_observer(fx.events.observer().clone());
    fx.player.select(0, &p1, &q);
    assert_eq!(fx.events.selected(), 2);

    assert!(fx.player.remove_observer(fx.events.observer()));
    fx.events.clear();
    fx.player.select(1, &p1, &q);
    assert_eq!(fx.events.selected(), 1);
}

#[test]
fn test_keep_playing_reissues_playback_only_when_playing() {
    let fx = Fixture::new();
    let p1 = playlist("p1", vec![stream("a")]);
    let q = queue(&[p1.clone()]);

    fx.player.select(0, &p1, &q);
    fx.player.keep_playing();
    assert!(!fx.av.lock().unwrap().playing);

    fx.player.play();
    fx.av.lock().unwrap().playing = false;
    fx.player.keep_playing();
    assert!(fx.av.lock().unwrap().playing);
}
