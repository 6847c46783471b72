use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IdentityStore, MessageSummary, PositionFix, SegmentId, SegmentKind, Ssvid};

/// Serializable snapshot of one segment, sufficient to resume matching
/// without any of the original message payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentState {
    pub id: SegmentId,
    pub kind: SegmentKind,
    pub msg_count: u64,
    pub last_msg: MessageSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_positional: Option<PositionFix>,
    pub identity: IdentityStore,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub msgids: Vec<String>,
    pub active: bool,
}

/// Serializable snapshot of a whole segmenter. Restoring it yields a
/// segmenter that produces byte-identical output from the next message
/// onward, storage of the snapshot is the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterState {
    pub ssvid: Ssvid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub minted: Vec<(DateTime<Utc>, u32)>,
    pub segments: Vec<SegmentState>,
}
