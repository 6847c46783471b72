use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::Visitor, Deserialize, Serialize};

use crate::{
    error::{error::InvalidSegmentIdSnafu, Error},
    IdentityMatch, IdentityStore, Message, MessageClass, MessageSummary, PositionFix,
    SegmentState, SegmenterConfig, Ssvid,
};

const SEGMENT_ID_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// What a segment holds. `Bad` and `Noise` segments are terminal, they tag
/// exactly one message and never absorb another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum SegmentKind {
    Positional,
    Info,
    Bad,
    Noise,
}

impl SegmentKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SegmentKind::Bad | SegmentKind::Noise)
    }
}

/// Identity of a segment, rendered as
/// `{ssvid}-{YYYYMMDDTHHMMSSZ}-{seq}` where the timestamp is the first
/// message's and `seq` starts at 1 per `(ssvid, timestamp)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId {
    pub ssvid: Ssvid,
    pub first_timestamp: DateTime<Utc>,
    pub seq: u32,
}

impl Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.ssvid,
            self.first_timestamp.format(SEGMENT_ID_TIMESTAMP_FORMAT),
            self.seq
        )
    }
}

impl FromStr for SegmentId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        // Parse from the right so a leading minus in the ssvid survives.
        let mut parts = value.rsplitn(3, '-');
        let (Some(seq), Some(timestamp), Some(ssvid)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return InvalidSegmentIdSnafu { value }.fail();
        };

        let seq = seq
            .parse()
            .map_err(|_| InvalidSegmentIdSnafu { value }.build())?;
        let first_timestamp = NaiveDateTime::parse_from_str(timestamp, SEGMENT_ID_TIMESTAMP_FORMAT)
            .map_err(|_| InvalidSegmentIdSnafu { value }.build())?
            .and_utc();
        let ssvid = Ssvid(
            ssvid
                .parse()
                .map_err(|_| InvalidSegmentIdSnafu { value }.build())?,
        );

        Ok(SegmentId {
            ssvid,
            first_timestamp,
            seq,
        })
    }
}

impl Serialize for SegmentId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SegmentId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SegmentIdVisitor;

        impl<'de> Visitor<'de> for SegmentIdVisitor {
            type Value = SegmentId;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a segment id string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(|_| {
                    serde::de::Error::invalid_value(serde::de::Unexpected::Str(v), &self)
                })
            }
        }

        deserializer.deserialize_str(SegmentIdVisitor)
    }
}

/// One active track of a single ssvid. Holds rolling summaries and the
/// identity stores rather than full message payloads, memory per segment
/// is bounded by `ident_cap`.
#[derive(Debug, Clone)]
pub struct Segment {
    id: SegmentId,
    kind: SegmentKind,
    msg_count: u64,
    last_msg: MessageSummary,
    last_positional: Option<PositionFix>,
    identity: IdentityStore,
    msgids: Vec<String>,
    active: bool,
}

impl Segment {
    pub(crate) fn new(
        id: SegmentId,
        msg: &Message,
        class: MessageClass,
        config: &SegmenterConfig,
    ) -> Segment {
        let kind = match class {
            MessageClass::Positional => SegmentKind::Positional,
            _ => SegmentKind::Info,
        };
        let mut segment = Segment {
            id,
            kind,
            msg_count: 0,
            // Segments are only born from messages carrying a timestamp.
            last_msg: MessageSummary {
                msgid: msg.msgid.clone(),
                timestamp: id.first_timestamp,
            },
            last_positional: None,
            identity: IdentityStore::default(),
            msgids: Vec::new(),
            active: true,
        };
        segment.add(msg, class, config);
        segment
    }

    pub(crate) fn add(&mut self, msg: &Message, class: MessageClass, config: &SegmenterConfig) {
        self.msg_count += 1;
        if let Some(summary) = msg.summary() {
            self.last_msg = summary;
        }
        if class == MessageClass::Positional {
            self.last_positional = msg.position_fix();
            // An identity-born segment becomes positional with its first fix.
            self.kind = SegmentKind::Positional;
        }
        if let Some(seen) = msg.timestamp {
            self.identity.observe(&msg.identity_tuple(), seen, config);
        }
        if config.retain_messages {
            if let Some(msgid) = &msg.msgid {
                self.msgids.push(msgid.clone());
            }
        }
    }

    pub fn identity_matches(&self, msg: &Message) -> IdentityMatch {
        self.identity.matches(&msg.identity_tuple())
    }

    /// Hours since this segment last absorbed a message of any kind.
    pub fn age(&self, now: DateTime<Utc>) -> f64 {
        crate::discrepancy::hours(self.last_msg.timestamp, now)
    }

    pub fn is_stale(&self, now: DateTime<Utc>, max_hours: f64) -> bool {
        self.age(now) > max_hours
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn ssvid(&self) -> Ssvid {
        self.id.ssvid
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn msg_count(&self) -> u64 {
        self.msg_count
    }

    pub fn last_msg(&self) -> &MessageSummary {
        &self.last_msg
    }

    pub fn last_positional(&self) -> Option<&PositionFix> {
        self.last_positional.as_ref()
    }

    pub fn identity(&self) -> &IdentityStore {
        &self.identity
    }

    pub fn msgids(&self) -> &[String] {
        &self.msgids
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn retire(&mut self) {
        self.active = false;
    }

    pub fn state(&self) -> SegmentState {
        SegmentState {
            id: self.id,
            kind: self.kind,
            msg_count: self.msg_count,
            last_msg: self.last_msg.clone(),
            last_positional: self.last_positional,
            identity: self.identity.clone(),
            msgids: self.msgids.clone(),
            active: self.active,
        }
    }

    pub(crate) fn from_state(state: SegmentState) -> Segment {
        Segment {
            id: state.id,
            kind: state.kind,
            msg_count: state.msg_count,
            last_msg: state.last_msg,
            last_positional: state.last_positional,
            identity: state.identity,
            msgids: state.msgids,
            active: state.active,
        }
    }
}
