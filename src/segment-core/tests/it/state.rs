use segment_core::{SegmentKind, Segmenter, SegmenterConfig, SegmenterState};

use crate::helper::{info, named, position, segmenter};

#[test]
fn test_restored_segmenter_reproduces_the_uninterrupted_run() {
    let head = vec![
        named(0, 0.0, 0.0, "ALPHA"),
        named(300, 0.0, 0.02, "ALPHA"),
        named(600, 5.0, 0.0, "BRAVO"),
        info(660, "BRAVO"),
    ];
    let tail = vec![
        named(900, 0.0, 0.05, "ALPHA"),
        named(960, 5.0, 0.004, "BRAVO"),
        position(1200, 0.0, 0.07),
        position(1200, 40.0, 40.0),
    ];

    let mut uninterrupted = segmenter();
    for msg in head.clone() {
        uninterrupted.process(msg).unwrap();
    }

    let mut interrupted = segmenter();
    for msg in head {
        interrupted.process(msg).unwrap();
    }
    let snapshot = serde_json::to_string(&interrupted.snapshot()).unwrap();
    drop(interrupted);

    let state: SegmenterState = serde_json::from_str(&snapshot).unwrap();
    let mut restored = Segmenter::restore(state, SegmenterConfig::default()).unwrap();

    for msg in tail {
        let expected = uninterrupted.process(msg.clone()).unwrap();
        let actual = restored.process(msg).unwrap();
        assert_eq!(
            expected.to_record("segment").unwrap(),
            actual.to_record("segment").unwrap()
        );
        assert_eq!(expected.kind, actual.kind);
    }
}

#[test]
fn test_snapshot_preserves_identity_confirmation() {
    let mut original = segmenter();
    original.process(named(0, 0.0, 0.0, "ALPHA")).unwrap();
    original.process(named(60, 0.0, 0.002, "ALPHA")).unwrap();

    let mut restored =
        Segmenter::restore(original.snapshot(), SegmenterConfig::default()).unwrap();

    // A conflicting name immediately after restore must still split.
    let tagged = restored.process(named(120, 0.0, 0.004, "BRAVO")).unwrap();
    assert_eq!(restored.active_segments().len(), 2);
    assert_eq!(tagged.segment, restored.active_segments()[1].id());
}

#[test]
fn test_restore_filters_terminal_segments() {
    let mut original = segmenter();
    original.process(position(0, 0.0, 0.0)).unwrap();
    // A near-duplicate mints a terminal noise segment.
    let noise = original.process(position(30, 0.0, 0.0)).unwrap();
    assert_eq!(noise.kind, SegmentKind::Noise);

    let mut state = original.snapshot();
    // Simulate a snapshot writer that also persisted terminal segments.
    let mut terminal = state.segments[0].clone();
    terminal.kind = SegmentKind::Noise;
    terminal.id.seq += 10;
    state.segments.push(terminal);

    let restored = Segmenter::restore(state, SegmenterConfig::default()).unwrap();
    assert_eq!(restored.active_segments().len(), 1);
    assert_eq!(
        restored.active_segments()[0].kind(),
        SegmentKind::Positional
    );
}

#[test]
fn test_restore_preserves_the_id_counter() {
    let mut original = segmenter();
    original.process(position(0, 0.0, 0.0)).unwrap();
    original.process(position(0, 40.0, 40.0)).unwrap();

    let mut restored =
        Segmenter::restore(original.snapshot(), SegmenterConfig::default()).unwrap();

    // A third implausible position in the same second must not reuse seq 2.
    let tagged = restored.process(position(0, -40.0, -40.0)).unwrap();
    assert_eq!(tagged.segment.seq, 3);
}

#[test]
fn test_restore_keeps_the_input_order_contract() {
    let mut original = segmenter();
    original.process(position(3600, 0.0, 0.0)).unwrap();

    let mut restored =
        Segmenter::restore(original.snapshot(), SegmenterConfig::default()).unwrap();

    assert!(restored.process(position(0, 0.0, 0.0)).is_err());
}
