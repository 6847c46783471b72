use chrono::{DateTime, Utc};
use serde::{de::Visitor, Deserialize, Serialize};

use crate::SegmenterConfig;

/// Source specific vessel id, an MMSI for AIS sources. Not guaranteed to
/// belong to a single real vessel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Ssvid(pub i32);

/// A decoded AIS message as consumed by the core. Parsing the wire format
/// is the caller's concern, all fields that may be missing or unparseable
/// upstream are optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msgid: Option<String>,
    pub ssvid: Ssvid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imo: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Receiver that picked the message up. Carried through to the output
    /// but never consulted when matching identities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    /// Fields of the input record the core does not consume, preserved so
    /// output records are the input records plus the segment tag.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Transponder class a message type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum TypeClass {
    A,
    B,
    Other,
}

/// How the core will treat a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// Unusable values, emitted in a terminal [`crate::SegmentKind::Bad`]
    /// segment.
    Bad(BadReason),
    /// No positional fix, identity information only.
    Info,
    /// Carries a positional fix.
    Positional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BadReason {
    MissingTimestamp,
    LatitudeOutOfRange,
    LongitudeOutOfRange,
    SpeedOutOfRange,
    Unusable,
}

/// Rolling kinematic state, the last positional fix of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    pub speed: Option<f64>,
    pub course: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<u32>,
}

/// Rolling summary of the last message of any kind in a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msgid: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The identity attributes of a message, extracted once per message and
/// fed to the per-segment identity stores.
#[derive(Debug, Clone, Copy)]
pub struct IdentityTuple<'a> {
    pub shipname: Option<&'a str>,
    pub callsign: Option<&'a str>,
    pub imo: Option<i32>,
    pub destination: Option<&'a str>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub type_class: Option<TypeClass>,
}

/// Class-A positional types are 1-3 and class-B 18-19, the identity types
/// 5 and 24 report for class-A and class-B transponders respectively.
pub fn type_class(message_type: u32) -> TypeClass {
    match message_type {
        1 | 2 | 3 | 5 => TypeClass::A,
        18 | 19 | 24 => TypeClass::B,
        _ => TypeClass::Other,
    }
}

const IDENTITY_TYPES: [u32; 3] = [5, 19, 24];

impl Message {
    /// Coerce unusable numeric values to absent and canonicalize the rest.
    /// Identity strings are only trimmed, a value that trims to nothing is
    /// treated as absent.
    pub fn normalize(&mut self) {
        self.speed = self.speed.filter(|v| v.is_finite());
        self.heading = self.heading.filter(|v| v.is_finite());
        self.length = self.length.filter(|v| v.is_finite());
        self.width = self.width.filter(|v| v.is_finite());
        self.course = self
            .course
            .filter(|v| v.is_finite())
            .map(|v| v.rem_euclid(360.0));

        for value in [&mut self.shipname, &mut self.callsign, &mut self.destination] {
            *value = value
                .take()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
        }
    }

    /// Classify a normalized message. The speed bound is the reported-speed
    /// gate of the matcher, values beyond it never describe a real track.
    pub fn classify(&self, config: &SegmenterConfig) -> MessageClass {
        if self.timestamp.is_none() {
            return MessageClass::Bad(BadReason::MissingTimestamp);
        }
        if self.lat.is_some_and(|lat| !(-90.0..=90.0).contains(&lat)) {
            return MessageClass::Bad(BadReason::LatitudeOutOfRange);
        }
        if self.lon.is_some_and(|lon| !(-180.0..=180.0).contains(&lon)) {
            return MessageClass::Bad(BadReason::LongitudeOutOfRange);
        }
        let max_reported = config.max_speed * config.reported_speed_multiplier;
        if self
            .speed
            .is_some_and(|speed| !(0.0..=max_reported).contains(&speed))
        {
            return MessageClass::Bad(BadReason::SpeedOutOfRange);
        }

        if self.lat.is_some() && self.lon.is_some() {
            MessageClass::Positional
        } else if self
            .message_type
            .is_some_and(|t| IDENTITY_TYPES.contains(&t))
        {
            MessageClass::Info
        } else {
            MessageClass::Bad(BadReason::Unusable)
        }
    }

    pub fn identity_tuple(&self) -> IdentityTuple<'_> {
        IdentityTuple {
            shipname: self.shipname.as_deref(),
            callsign: self.callsign.as_deref(),
            imo: self.imo,
            destination: self.destination.as_deref(),
            length: self.length,
            width: self.width,
            type_class: self.message_type.map(type_class),
        }
    }

    pub fn position_fix(&self) -> Option<PositionFix> {
        Some(PositionFix {
            timestamp: self.timestamp?,
            lat: self.lat?,
            lon: self.lon?,
            speed: self.speed,
            course: self.course,
            message_type: self.message_type,
        })
    }

    pub fn summary(&self) -> Option<MessageSummary> {
        Some(MessageSummary {
            msgid: self.msgid.clone(),
            timestamp: self.timestamp?,
        })
    }
}

impl std::fmt::Display for Ssvid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Ssvid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SsvidVisitor;

        impl<'de> Visitor<'de> for SsvidVisitor {
            type Value = Ssvid;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a ssvid value")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Ssvid(v as i32))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Ssvid(v as i32))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Ssvid(v.parse().map_err(|_| {
                    serde::de::Error::invalid_value(serde::de::Unexpected::Str(v), &self)
                })?))
            }
        }

        deserializer.deserialize_i64(SsvidVisitor)
    }
}
