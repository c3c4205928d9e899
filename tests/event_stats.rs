use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rmqtt_event_stats::{EventStatisticSummary, ManualClock, RateTracker};

const MINUTE: Duration = Duration::from_secs(60);

fn setup() -> (Arc<ManualClock>, RateTracker<Arc<ManualClock>>) {
    let clock = Arc::new(ManualClock::at_epoch());
    let tracker = RateTracker::with_default_window(clock.clone());
    (clock, tracker)
}

fn report(tracker: &RateTracker<Arc<ManualClock>>) -> String {
    let mut out = Vec::new();
    tracker.print_statistic(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn no_events() {
    let (_clock, tracker) = setup();
    assert!(tracker.list_all().is_empty());
    assert_eq!(tracker.query("asd"), EventStatisticSummary::new("asd", 0.0));
    assert_eq!(
        report(&tracker),
        "No events happened for the past 60 minutes :(\n"
    );
}

#[test]
fn one_event() {
    let (_clock, tracker) = setup();
    let expected = EventStatisticSummary::new("asd", 1.0 / 60.0);

    tracker.record("asd");

    assert_eq!(tracker.list_all(), vec![expected.clone()]);
    assert_eq!(tracker.query("asd"), expected);
    assert_eq!(
        report(&tracker),
        "Event statistics for the past 60 minutes:\n\
         Request rate is 0.016666666666666666 requests per minute for 'asd' event.\n"
    );
}

#[test]
fn many_events() {
    let (_clock, tracker) = setup();
    tracker.record("asd2");
    tracker.record("asd1");

    let expected = vec![
        EventStatisticSummary::new("asd1", 1.0 / 60.0),
        EventStatisticSummary::new("asd2", 1.0 / 60.0),
    ];
    assert_eq!(tracker.list_all(), expected);
    assert_eq!(tracker.query("asd1"), expected[0]);
    assert_eq!(tracker.query("asd2"), expected[1]);
    assert_eq!(
        report(&tracker),
        "Event statistics for the past 60 minutes:\n\
         Request rate is 0.016666666666666666 requests per minute for 'asd1' event.\n\
         Request rate is 0.016666666666666666 requests per minute for 'asd2' event.\n"
    );
}

#[test]
fn events_cleared_after_an_hour() {
    let (clock, tracker) = setup();
    tracker.record("asd1");
    tracker.record("asd2");

    clock.advance(MINUTE * 60);

    assert!(tracker.list_all().is_empty());
    assert_eq!(tracker.query("asd1"), EventStatisticSummary::new("asd1", 0.0));
    assert_eq!(tracker.query("asd2"), EventStatisticSummary::new("asd2", 0.0));
    assert!(tracker.is_empty());
    assert_eq!(
        report(&tracker),
        "No events happened for the past 60 minutes :(\n"
    );
}

#[test]
fn events_kept_just_below_an_hour() {
    let (clock, tracker) = setup();
    tracker.record("asd1");
    tracker.record("asd2");

    clock.advance(MINUTE * 59);

    let expected = vec![
        EventStatisticSummary::new("asd1", 1.0 / 60.0),
        EventStatisticSummary::new("asd2", 1.0 / 60.0),
    ];
    assert_eq!(tracker.list_all(), expected);
    assert_eq!(tracker.query("asd1"), expected[0]);
    assert_eq!(tracker.query("asd2"), expected[1]);
}

#[test]
fn one_per_minute_saturates_window() {
    let (clock, tracker) = setup();
    for _ in 0..120 {
        clock.advance(MINUTE);
        tracker.record("asd");
    }

    let expected = EventStatisticSummary::new("asd", 1.0);
    assert_eq!(tracker.list_all(), vec![expected.clone()]);
    assert_eq!(tracker.query("asd"), expected);
    assert_eq!(tracker.count("asd"), 60);
    assert_eq!(
        report(&tracker),
        "Event statistics for the past 60 minutes:\n\
         Request rate is 1.0 requests per minute for 'asd' event.\n"
    );
}

#[test]
fn many_events_within_a_minute() {
    let (clock, tracker) = setup();
    for _ in 0..60 {
        clock.advance(Duration::from_millis(1));
        tracker.record("asd");
    }

    assert_eq!(tracker.query("asd"), EventStatisticSummary::new("asd", 1.0));
    assert_eq!(tracker.recent_count("asd"), 60);
}

#[test]
fn reads_are_idempotent() {
    let (clock, tracker) = setup();
    tracker.record("b");
    tracker.record("a");
    clock.advance(MINUTE * 30);
    tracker.record("a");

    let first = tracker.list_all();
    assert_eq!(tracker.list_all(), first);
    assert_eq!(tracker.query("a"), tracker.query("a"));
    assert_eq!(tracker.len(), 2);
}

#[test]
fn random_events() {
    let (clock, tracker) = setup();
    let mut rng = StdRng::seed_from_u64(42);

    let mut events = (1..=10)
        .map(|i| {
            let per_minute = (0..60).map(|_| rng.random_range(0..5)).collect::<Vec<u32>>();
            (format!("event{}", i), per_minute)
        })
        .collect::<Vec<_>>();

    let expected = events
        .iter()
        .filter(|(_, per_minute)| per_minute.iter().any(|n| *n > 0))
        .map(|(name, per_minute)| {
            let total: u32 = per_minute.iter().sum();
            (name.clone(), total as f64 / 60.0)
        })
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(name, rate)| EventStatisticSummary::new(name, rate))
        .collect::<Vec<_>>();

    for minute in 0..60 {
        clock.advance(MINUTE);
        events.shuffle(&mut rng);
        for (name, per_minute) in &events {
            for _ in 0..per_minute[minute] {
                tracker.record(name);
            }
        }
    }

    assert_eq!(tracker.list_all(), expected);
    assert_eq!(
        tracker.query("nonExistentEventName"),
        EventStatisticSummary::new("nonExistentEventName", 0.0)
    );
    for summary in &expected {
        assert_eq!(&tracker.query(&summary.event_name), summary);
    }
}

#[test]
fn summary_serializes() {
    let summary = EventStatisticSummary::new("asd", 0.5);
    let json = serde_json::to_string(&summary).unwrap();
    assert_eq!(json, r#"{"event_name":"asd","requests_per_minute":0.5}"#);
    let back: EventStatisticSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(back, summary);
}
