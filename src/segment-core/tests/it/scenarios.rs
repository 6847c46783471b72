use std::collections::{HashMap, HashSet};

use segment_core::{Message, SegmentKind, Segmenter, SegmenterConfig};

use crate::helper::{at, info, named, position, segmenter, underway, SSVID};

#[test]
fn test_straight_track_stays_in_one_segment() {
    let mut segmenter = segmenter();

    // 10 knots due east along the equator, one fix per hour.
    let tagged: Vec<_> = [
        underway(0, 0.0, 0.0, 10.0, 90.0),
        underway(3600, 0.0, 10.0 / 60.0, 10.0, 90.0),
        underway(7200, 0.0, 20.0 / 60.0, 10.0, 90.0),
    ]
    .into_iter()
    .map(|msg| segmenter.process(msg).unwrap())
    .collect();

    for tagged in &tagged {
        assert_eq!(tagged.segment.to_string(), "123456789-19700101T000000Z-1");
        assert_eq!(tagged.kind, SegmentKind::Positional);
    }
    assert_eq!(segmenter.active_segments().len(), 1);
    assert_eq!(segmenter.active_segments()[0].msg_count(), 3);
}

#[test]
fn test_teleport_starts_a_second_segment() {
    let mut segmenter = segmenter();

    let first = segmenter.process(position(0, 0.0, 0.0)).unwrap();
    // 1200 NM east ten minutes later.
    let second = segmenter.process(position(600, 0.0, 20.0)).unwrap();

    assert_ne!(first.segment, second.segment);
    assert_eq!(second.segment.first_timestamp, at(600));
    assert_eq!(segmenter.active_segments().len(), 2);
    assert!(segmenter
        .active_segments()
        .iter()
        .all(|s| s.msg_count() == 1));
}

#[test]
fn test_near_duplicate_is_absorbed_as_noise() {
    let mut segmenter = segmenter();

    let first = segmenter.process(position(0, 0.0, 0.0)).unwrap();
    let duplicate = segmenter.process(position(30, 0.0001, 0.0001)).unwrap();
    let third = segmenter.process(position(3600, 0.0, 0.167)).unwrap();

    assert_eq!(duplicate.kind, SegmentKind::Noise);
    assert_ne!(duplicate.segment, first.segment);
    // The noise fix left the segment untouched, the later fix still chains
    // onto the original position.
    assert_eq!(third.segment, first.segment);
    assert_eq!(segmenter.active_segments().len(), 1);
    assert_eq!(segmenter.active_segments()[0].msg_count(), 2);
}

#[test]
fn test_exact_duplicate_is_noise() {
    let mut segmenter = segmenter();

    let first = segmenter.process(position(0, 10.0, 10.0)).unwrap();
    let second = segmenter.process(position(0, 10.0, 10.0)).unwrap();

    assert_eq!(first.kind, SegmentKind::Positional);
    assert_eq!(second.kind, SegmentKind::Noise);
    assert_ne!(second.segment, first.segment);
    assert_eq!(segmenter.active_segments()[0].msg_count(), 1);
}

#[test]
fn test_conflicting_shipnames_split_the_stream() {
    let mut segmenter = segmenter();

    let first = segmenter.process(named(0, 0.0, 0.0, "ALPHA")).unwrap();
    let second = segmenter.process(named(60, 0.0, 0.001, "BRAVO")).unwrap();
    let third = segmenter.process(named(120, 0.0, 0.002, "ALPHA")).unwrap();

    assert_ne!(second.segment, first.segment);
    assert_eq!(third.segment, first.segment);
    assert_eq!(segmenter.active_segments().len(), 2);
}

#[test]
fn test_gap_larger_than_max_hours_retires_the_segment() {
    let mut segmenter = segmenter();

    let first = segmenter.process(position(0, 0.0, 0.0)).unwrap();
    let second = segmenter.process(position(25 * 3600, 0.0, 1.0 / 60.0)).unwrap();

    assert_ne!(second.segment, first.segment);
    assert_eq!(segmenter.active_segments().len(), 1);
    assert_eq!(segmenter.active_segments()[0].id(), second.segment);
}

#[test]
fn test_bad_value_is_sunk_without_touching_the_active_set() {
    let mut segmenter = segmenter();

    let bad = segmenter.process(position(0, 95.0, 0.0)).unwrap();
    assert_eq!(bad.kind, SegmentKind::Bad);
    assert!(segmenter.active_segments().is_empty());

    let good = segmenter.process(position(60, 0.0, 0.0)).unwrap();
    assert_eq!(good.kind, SegmentKind::Positional);
    assert_ne!(good.segment, bad.segment);
    assert_eq!(segmenter.active_segments().len(), 1);
}

#[test]
fn test_every_message_is_tagged_in_input_order() {
    let mut segmenter = segmenter();

    let mut inputs = vec![
        named(0, 0.0, 0.0, "ALPHA"),
        position(0, 95.0, 0.0),
        info(30, "ALPHA"),
        position(60, 0.0001, 0.0001),
        named(600, 0.0, 0.01, "ALPHA"),
        position(25 * 3600, 10.0, 10.0),
    ];
    for (i, msg) in inputs.iter_mut().enumerate() {
        msg.msgid = Some(format!("m{i}"));
    }

    let tagged: Vec<_> = inputs
        .iter()
        .cloned()
        .map(|msg| segmenter.process(msg).unwrap())
        .collect();

    assert_eq!(tagged.len(), inputs.len());
    for (input, output) in inputs.iter().zip(&tagged) {
        assert_eq!(input.msgid, output.message.msgid);
        assert_eq!(output.segment.ssvid, SSVID);
    }
}

#[test]
fn test_minted_segment_ids_are_unique() {
    let mut segmenter = segmenter();

    let inputs = vec![
        position(0, 0.0, 0.0),
        position(0, 40.0, 40.0),
        position(0, -40.0, -40.0),
        position(30, 0.0, 0.0),
        position(30, 0.00005, 0.00005),
        position(60, 95.0, 0.0),
        position(60, 96.0, 0.0),
    ];

    let mut seen = HashSet::new();
    let mut terminal = Vec::new();
    for msg in inputs {
        let tagged = segmenter.process(msg).unwrap();
        if tagged.kind.is_terminal() {
            terminal.push(tagged.segment);
        } else {
            assert!(seen.insert(tagged.segment), "reused {}", tagged.segment);
        }
    }

    // Terminal sinks are single-message, their ids never recur anywhere.
    for id in &terminal {
        assert_eq!(terminal.iter().filter(|t| *t == id).count(), 1);
        assert!(!seen.contains(id));
    }
}

#[test]
fn test_timestamps_are_monotone_within_each_segment() {
    let mut segmenter = segmenter();

    let inputs = vec![
        named(0, 0.0, 0.0, "ALPHA"),
        named(60, 0.0, 20.0, "BRAVO"),
        named(120, 0.001, 0.0, "ALPHA"),
        named(180, 0.001, 20.0, "BRAVO"),
        info(200, "ALPHA"),
        named(240, 0.002, 0.0, "ALPHA"),
    ];

    let mut last_per_segment = HashMap::new();
    for msg in inputs {
        let tagged = segmenter.process(msg).unwrap();
        let timestamp = tagged.message.timestamp.unwrap();
        if let Some(previous) = last_per_segment.insert(tagged.segment, timestamp) {
            assert!(timestamp >= previous);
        }
    }
}

#[test]
fn test_two_interleaved_vessels_keep_separate_segments() {
    let mut segmenter = segmenter();

    let mut expect_alpha = None;
    let mut expect_bravo = None;
    for minute in 0..10 {
        let (name, lat, expected) = if minute % 2 == 0 {
            (("ALPHA"), 0.0, &mut expect_alpha)
        } else {
            (("BRAVO"), 5.0, &mut expect_bravo)
        };
        let msg = named(minute * 60, lat, 0.001 * minute as f64, name);
        let tagged = segmenter.process(msg).unwrap();
        match expected {
            None => *expected = Some(tagged.segment),
            Some(id) => assert_eq!(tagged.segment, *id, "minute {minute}"),
        }
    }

    assert_eq!(segmenter.active_segments().len(), 2);
}

#[test]
fn test_match_stats_are_attached_when_enabled() {
    let config = SegmenterConfig {
        collect_match_stats: true,
        ..Default::default()
    };
    let mut segmenter = Segmenter::new(SSVID, config).unwrap();

    segmenter.process(position(0, 0.0, 0.0)).unwrap();
    let tagged = segmenter.process(position(600, 0.0, 0.01)).unwrap();

    let matches = tagged.matches.as_ref().unwrap();
    assert_eq!(matches.len(), 1);
    assert!(matches[0].eligible);

    let record = tagged.to_record("segment").unwrap();
    assert!(record.get("segment_matches").is_some());
}

#[test]
fn test_identity_only_stream_yields_info_segments() {
    let mut segmenter = segmenter();

    let first = segmenter.process(info(0, "ALPHA")).unwrap();
    assert_eq!(first.kind, SegmentKind::Info);

    let second = segmenter.process(info(60, "ALPHA")).unwrap();
    assert_eq!(second.segment, first.segment);

    // A positional fix upgrades the identity-born segment.
    let third = segmenter.process(position(120, 0.0, 0.0)).unwrap();
    assert_eq!(third.segment, first.segment);
    assert_eq!(third.kind, SegmentKind::Positional);
}

#[test]
fn test_receiver_is_ignored_for_identity() {
    let mut segmenter = segmenter();

    let mut first = named(0, 0.0, 0.0, "ALPHA");
    first.receiver = Some("rcvr-1".to_string());
    let mut second = named(60, 0.0, 0.002, "ALPHA");
    second.receiver = Some("rcvr-2".to_string());

    let first = segmenter.process(first).unwrap();
    let second = segmenter.process(second).unwrap();
    assert_eq!(first.segment, second.segment);
}

fn process_all(segmenter: &mut Segmenter, messages: Vec<Message>) -> Vec<String> {
    messages
        .into_iter()
        .map(|msg| segmenter.process(msg).unwrap().segment.to_string())
        .collect()
}

#[test]
fn test_reported_and_implied_speed_gates_are_independent() {
    let mut segmenter = segmenter();

    // Implausible implied speed with no reported speed still splits.
    let ids = process_all(
        &mut segmenter,
        vec![position(0, 0.0, 0.0), position(600, 0.0, 2.0)],
    );
    assert_ne!(ids[0], ids[1]);

    // Plausible movement with an implausible reported speed is bad input,
    // not a new segment.
    let mut msg = position(1200, 0.0, 2.001);
    msg.speed = Some(40.0);
    let tagged = segmenter.process(msg).unwrap();
    assert_eq!(tagged.kind, SegmentKind::Bad);
}
