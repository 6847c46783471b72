use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use snafu::{ensure, ResultExt};
use tracing::debug;

use crate::{
    error::{
        error::{SerializationSnafu, SsvidMismatchSnafu, UnsortedInputSnafu},
        Result,
    },
    matcher::Matcher,
    MatchDecision, Message, MessageClass, Segment, SegmentId, SegmentKind, SegmentMatch,
    SegmentState, SegmenterConfig, SegmenterState, Ssvid,
};

/// An input message tagged with the segment it was assigned to.
#[derive(Debug, Clone)]
pub struct TaggedMessage {
    pub message: Message,
    pub segment: SegmentId,
    pub kind: SegmentKind,
    /// Per-segment score records, present when `collect_match_stats` is
    /// enabled.
    pub matches: Option<Vec<SegmentMatch>>,
}

impl TaggedMessage {
    /// The output record: the input record with the segment id added under
    /// `segment_field`, and the match stats under `segment_matches` when
    /// collected.
    pub fn to_record(&self, segment_field: &str) -> Result<serde_json::Value> {
        let mut value = serde_json::to_value(&self.message).context(SerializationSnafu)?;
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                segment_field.to_string(),
                serde_json::Value::String(self.segment.to_string()),
            );
            if let Some(matches) = &self.matches {
                map.insert(
                    "segment_matches".to_string(),
                    serde_json::to_value(matches).context(SerializationSnafu)?,
                );
            }
        }
        Ok(value)
    }
}

/// Streaming state machine partitioning one ssvid's messages into
/// continuous track segments. Not safe under concurrent mutation, distinct
/// ssvids use distinct instances.
#[derive(Debug)]
pub struct Segmenter {
    ssvid: Ssvid,
    config: SegmenterConfig,
    matcher: Matcher,
    active: Vec<Segment>,
    minted: BTreeMap<DateTime<Utc>, u32>,
    prev_timestamp: Option<DateTime<Utc>>,
}

impl Segmenter {
    pub fn new(ssvid: Ssvid, config: SegmenterConfig) -> Result<Segmenter> {
        config.validate()?;
        Ok(Segmenter {
            ssvid,
            matcher: Matcher::new(config.clone()),
            config,
            active: Vec::new(),
            minted: BTreeMap::new(),
            prev_timestamp: None,
        })
    }

    /// Assign `msg` to exactly one segment and return it tagged with that
    /// segment's id. Messages must arrive in non-decreasing timestamp
    /// order, a violation is fatal.
    pub fn process(&mut self, mut msg: Message) -> Result<TaggedMessage> {
        ensure!(
            msg.ssvid == self.ssvid,
            SsvidMismatchSnafu {
                expected: self.ssvid,
                got: msg.ssvid,
            }
        );
        if let Some(current) = msg.timestamp {
            if let Some(previous) = self.prev_timestamp {
                ensure!(
                    current >= previous,
                    UnsortedInputSnafu {
                        ssvid: self.ssvid,
                        previous,
                        current,
                    }
                );
            }
            self.prev_timestamp = Some(current);
        }

        msg.normalize();
        let class = msg.classify(&self.config);

        let now = match (class, msg.timestamp) {
            (MessageClass::Bad(reason), timestamp) => {
                debug!(ssvid = %self.ssvid, reason = %reason, "rejected bad message");
                let id = self.mint(timestamp.unwrap_or(DateTime::UNIX_EPOCH));
                return Ok(TaggedMessage {
                    message: msg,
                    segment: id,
                    kind: SegmentKind::Bad,
                    matches: None,
                });
            }
            (_, Some(now)) => now,
            (_, None) => {
                let id = self.mint(DateTime::UNIX_EPOCH);
                return Ok(TaggedMessage {
                    message: msg,
                    segment: id,
                    kind: SegmentKind::Bad,
                    matches: None,
                });
            }
        };

        self.retire_stale(now);

        let (decision, stats) = self.matcher.best_match(&msg, class, &self.active);
        let matches = self.config.collect_match_stats.then_some(stats);

        let (segment, kind) = match decision {
            MatchDecision::Noise => {
                debug!(ssvid = %self.ssvid, "near-duplicate fix emitted as noise");
                (self.mint(now), SegmentKind::Noise)
            }
            MatchDecision::Existing(id) => {
                let segment = self.active.iter_mut().find(|s| s.id() == id).unwrap();
                segment.add(&msg, class, &self.config);
                (id, segment.kind())
            }
            MatchDecision::NewSegment => {
                self.enforce_open_segment_cap();
                let id = self.mint(now);
                let segment = Segment::new(id, &msg, class, &self.config);
                debug!(ssvid = %self.ssvid, segment = %id, kind = %segment.kind(), "opened segment");
                let kind = segment.kind();
                self.active.push(segment);
                (id, kind)
            }
        };

        Ok(TaggedMessage {
            message: msg,
            segment,
            kind,
            matches,
        })
    }

    /// Retire every active segment and return their final states.
    pub fn flush(&mut self) -> Vec<SegmentState> {
        self.active
            .drain(..)
            .map(|mut segment| {
                segment.retire();
                segment.state()
            })
            .collect()
    }

    pub fn snapshot(&self) -> SegmenterState {
        SegmenterState {
            ssvid: self.ssvid,
            prev_timestamp: self.prev_timestamp,
            minted: self.minted.iter().map(|(ts, seq)| (*ts, *seq)).collect(),
            segments: self.active.iter().map(Segment::state).collect(),
        }
    }

    /// Rebuild a segmenter from a snapshot. Terminal segments in the
    /// snapshot are dropped, they never absorb further messages.
    pub fn restore(state: SegmenterState, config: SegmenterConfig) -> Result<Segmenter> {
        let mut segmenter = Segmenter::new(state.ssvid, config)?;
        segmenter.prev_timestamp = state.prev_timestamp;
        segmenter.minted = state.minted.into_iter().collect();
        segmenter.active = state
            .segments
            .into_iter()
            .filter(|s| s.active && !s.kind.is_terminal())
            .map(Segment::from_state)
            .collect();
        Ok(segmenter)
    }

    pub fn ssvid(&self) -> Ssvid {
        self.ssvid
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    pub fn active_segments(&self) -> &[Segment] {
        &self.active
    }

    fn mint(&mut self, first_timestamp: DateTime<Utc>) -> SegmentId {
        let seq = self.minted.get(&first_timestamp).copied().unwrap_or(1);
        self.minted.insert(first_timestamp, seq + 1);
        // Timestamps are non-decreasing, counters for older timestamps can
        // never be consulted again. The epoch slot backs messages without a
        // timestamp and is kept.
        self.minted
            .retain(|ts, _| *ts >= first_timestamp || *ts == DateTime::UNIX_EPOCH);
        SegmentId {
            ssvid: self.ssvid,
            first_timestamp,
            seq,
        }
    }

    fn retire_stale(&mut self, now: DateTime<Utc>) {
        for segment in &mut self.active {
            if segment.is_stale(now, self.config.max_hours) {
                debug!(ssvid = %self.ssvid, segment = %segment.id(), "retiring stale segment");
                segment.retire();
            }
        }
        self.active.retain(|s| s.is_active());
    }

    fn enforce_open_segment_cap(&mut self) {
        while self.active.len() >= self.config.max_open_segments {
            let Some(oldest) = self
                .active
                .iter()
                .enumerate()
                .min_by_key(|(_, s)| s.last_msg().timestamp)
                .map(|(i, _)| i)
            else {
                break;
            };
            let mut segment = self.active.remove(oldest);
            debug!(
                ssvid = %self.ssvid,
                segment = %segment.id(),
                "open segment cap reached, retiring oldest segment"
            );
            segment.retire();
        }
    }
}
