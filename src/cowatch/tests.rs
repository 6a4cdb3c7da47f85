use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::db::models::PlaybackEvent;
use crate::error::AnalyticsError;
use crate::models::WatchParty;
use crate::test_support::{at, EventBuilder};

const MINUTE: i64 = 60;

fn viewing(id: &str, user_id: i64, title: &str, offset: i64) -> PlaybackEvent {
    EventBuilder::new(id, user_id)
        .movie(title)
        .started(offset)
        .lasting(5_400)
        .build()
}

fn detect(events: &[PlaybackEvent], strategy: GroupingStrategy) -> Vec<WatchParty> {
    let config = CoWatchConfig {
        strategy,
        ..CoWatchConfig::default()
    };
    detect_watch_parties(events, &config, &CancellationToken::new()).unwrap()
}

#[test]
fn two_users_within_window_form_a_party() {
    let events = vec![
        viewing("a", 1, "Inception", 0),
        viewing("b", 2, "Inception", 10 * MINUTE),
    ];
    let parties = detect(&events, GroupingStrategy::Anchor);

    // Each event anchors a window containing the other.
    assert_eq!(parties.len(), 2);
    for party in &parties {
        assert_eq!(party.participant_count(), 2);
        assert!(party.has_user(1) && party.has_user(2));
        assert_eq!(party.event_count, 2);
        assert_eq!(party.total_duration_secs, 2 * 5_400);
    }
    assert_eq!(parties[0].anchor_event_id, "b");
    assert_eq!(parties[1].anchor_time, at(0));
}

#[test]
fn window_boundary_is_inclusive() {
    let inside = vec![viewing("a", 1, "Up", 0), viewing("b", 2, "Up", 15 * MINUTE)];
    assert_eq!(detect(&inside, GroupingStrategy::Anchor).len(), 2);

    let outside = vec![viewing("a", 1, "Up", 0), viewing("b", 2, "Up", 15 * MINUTE + 1)];
    assert!(detect(&outside, GroupingStrategy::Anchor).is_empty());
}

#[test]
fn solitary_viewer_is_never_a_party() {
    let events = vec![
        viewing("a", 1, "Heat", 0),
        viewing("b", 1, "Heat", MINUTE),
        viewing("c", 1, "Heat", 2 * MINUTE),
    ];
    assert!(detect(&events, GroupingStrategy::Anchor).is_empty());
    assert!(detect(&events, GroupingStrategy::ConnectedComponents).is_empty());
}

#[test]
fn different_content_never_groups() {
    let events = vec![
        EventBuilder::new("a", 1).episode("Dark", "Secrets").started(0).build(),
        EventBuilder::new("b", 2).episode("Dark", "Lies").started(0).build(),
        EventBuilder::new("c", 3).movie("Secrets").started(0).build(),
    ];
    assert!(detect(&events, GroupingStrategy::Anchor).is_empty());
}

#[test]
fn min_participants_is_honoured() {
    let events = vec![
        viewing("a", 1, "Alien", 0),
        viewing("b", 2, "Alien", MINUTE),
        viewing("c", 3, "Alien", 2 * MINUTE),
    ];
    let config = CoWatchConfig {
        min_participants: 3,
        ..CoWatchConfig::default()
    };
    let parties = detect_watch_parties(&events, &config, &CancellationToken::new()).unwrap();
    assert_eq!(parties.len(), 3);
    assert!(parties.iter().all(|p| p.participant_count() == 3));

    let config = CoWatchConfig {
        min_participants: 4,
        ..CoWatchConfig::default()
    };
    let parties = detect_watch_parties(&events, &config, &CancellationToken::new()).unwrap();
    assert!(parties.is_empty());
}

#[test]
fn same_location_needs_exactly_one_address() {
    let shared = vec![
        EventBuilder::new("a", 1).movie("Jaws").ip("10.0.0.5").build(),
        EventBuilder::new("b", 2).movie("Jaws").ip("10.0.0.5").started(60).build(),
        EventBuilder::new("c", 3).movie("Jaws").started(120).build(),
    ];
    assert!(detect(&shared, GroupingStrategy::ConnectedComponents)[0].same_location);

    let split = vec![
        EventBuilder::new("a", 1).movie("Jaws").ip("10.0.0.5").build(),
        EventBuilder::new("b", 2).movie("Jaws").ip("192.168.1.9").started(60).build(),
    ];
    assert!(!detect(&split, GroupingStrategy::ConnectedComponents)[0].same_location);

    let unknown = vec![
        EventBuilder::new("a", 1).movie("Jaws").build(),
        EventBuilder::new("b", 2).movie("Jaws").started(60).build(),
    ];
    assert!(!detect(&unknown, GroupingStrategy::ConnectedComponents)[0].same_location);
}

#[test]
fn components_chain_beyond_one_window() {
    // 0 -> 10min -> 20min: first and last are 20 minutes apart but linked.
    let events = vec![
        viewing("a", 1, "Coco", 0),
        viewing("b", 2, "Coco", 10 * MINUTE),
        viewing("c", 3, "Coco", 20 * MINUTE),
        viewing("d", 4, "Coco", 3 * 60 * MINUTE),
        viewing("e", 5, "Coco", 3 * 60 * MINUTE + MINUTE),
    ];
    let parties = detect(&events, GroupingStrategy::ConnectedComponents);

    assert_eq!(parties.len(), 2);
    assert_eq!(parties[0].anchor_event_id, "d");
    assert_eq!(parties[1].anchor_event_id, "a");
    assert_eq!(parties[1].participant_count(), 3);
}

#[test]
fn components_are_disjoint_while_anchors_overlap() {
    let events = vec![
        viewing("a", 1, "Coco", 0),
        viewing("b", 2, "Coco", 5 * MINUTE),
        viewing("c", 3, "Coco", 10 * MINUTE),
    ];

    let components = detect(&events, GroupingStrategy::ConnectedComponents);
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].event_count, 3);

    let anchored = detect(&events, GroupingStrategy::Anchor);
    assert_eq!(anchored.len(), 3);
    let total_events: usize = anchored.iter().map(|p| p.event_count).sum();
    assert!(total_events > events.len());
}

#[test]
fn component_parties_cover_each_event_once() {
    let offsets = [0, 3, 8, 40, 44, 90, 91, 92, 200];
    let events: Vec<_> = offsets
        .iter()
        .enumerate()
        .map(|(i, minutes)| viewing(&format!("e{i}"), i as i64 % 3 + 1, "Soul", minutes * MINUTE))
        .collect();
    let parties = detect(&events, GroupingStrategy::ConnectedComponents);

    let mut anchors = HashSet::new();
    let covered: usize = parties.iter().map(|p| p.event_count).sum();
    for party in &parties {
        assert!(anchors.insert(party.anchor_event_id.clone()));
    }
    assert!(covered <= events.len());
    assert_eq!(parties.len(), 3);
}

#[test]
fn repeated_user_counts_once() {
    let events = vec![
        viewing("a", 1, "Big", 0),
        viewing("b", 1, "Big", MINUTE),
        viewing("c", 2, "Big", 2 * MINUTE),
    ];
    let parties = detect(&events, GroupingStrategy::ConnectedComponents);
    assert_eq!(parties.len(), 1);
    assert_eq!(parties[0].participant_count(), 2);
    assert_eq!(parties[0].event_count, 3);
    assert_eq!(parties[0].participants[0].username, "user1");
}

#[test]
fn invalid_configuration_is_rejected() {
    for config in [
        CoWatchConfig {
            min_participants: 1,
            ..CoWatchConfig::default()
        },
        CoWatchConfig {
            proximity_window_secs: -1,
            ..CoWatchConfig::default()
        },
    ] {
        let err = detect_watch_parties(&[], &config, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, AnalyticsError::Validation(_)));
    }
}

#[test]
fn oversized_window_is_rejected_not_panicking() {
    let events = vec![viewing("a", 1, "Heat", 0), viewing("b", 2, "Heat", 3 * 86_400)];
    let huge = CoWatchConfig {
        proximity_window_secs: 10_000_000_000_000,
        ..CoWatchConfig::default()
    };
    let err = detect_watch_parties(&events, &huge, &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, AnalyticsError::Validation(_)));

    for strategy in [GroupingStrategy::Anchor, GroupingStrategy::ConnectedComponents] {
        let widest = CoWatchConfig {
            proximity_window_secs: crate::timebucket::MAX_SPAN_SECS,
            strategy,
            ..CoWatchConfig::default()
        };
        let parties = detect_watch_parties(&events, &widest, &CancellationToken::new()).unwrap();
        assert!(!parties.is_empty());
        assert!(parties.iter().all(|p| p.participant_count() == 2));
    }
}

#[test]
fn cancelled_token_aborts() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let events = vec![viewing("a", 1, "Heat", 0)];
    let err = detect_watch_parties(&events, &CoWatchConfig::default(), &cancel).unwrap_err();
    assert!(err.is_cancelled());
}

#[test]
fn output_is_deterministic() {
    let mut events = vec![
        viewing("a", 1, "Ran", 0),
        viewing("b", 2, "Ran", 0),
        viewing("c", 3, "Ran", 0),
    ];
    let first = detect(&events, GroupingStrategy::Anchor);
    events.reverse();
    let second = detect(&events, GroupingStrategy::Anchor);
    assert_eq!(first, second);
    assert_eq!(first[0].anchor_event_id, "a");
}
