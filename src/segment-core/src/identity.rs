use std::borrow::Borrow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IdentityTuple, SegmenterConfig, TypeClass};

/// Outcome of comparing one identity attribute of a message against a
/// segment's store for that attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttributeMatch {
    Match,
    Mismatch,
    Unknown,
}

/// One value observed for an identity attribute. A value is confirmed once
/// it has been observed `ident_confirm` times within `ident_window`, until
/// then it is provisional and never counts as a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedValue<T> {
    pub value: T,
    pub count: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_count: u32,
    pub confirmed: bool,
}

/// Bounded multiset of values observed for a single identity attribute,
/// evicting the least recently seen value beyond `ident_cap` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueHistory<T> {
    values: Vec<ObservedValue<T>>,
}

impl<T> Default for ValueHistory<T> {
    fn default() -> Self {
        ValueHistory { values: Vec::new() }
    }
}

impl<T: PartialEq> ValueHistory<T> {
    pub fn observe(&mut self, value: T, seen: DateTime<Utc>, config: &SegmenterConfig) {
        let window =
            chrono::Duration::from_std(config.ident_window).unwrap_or(chrono::Duration::MAX);

        match self.values.iter_mut().find(|v| v.value == value) {
            Some(entry) => {
                entry.count += 1;
                if seen - entry.window_start <= window {
                    entry.window_count += 1;
                } else {
                    entry.window_start = seen;
                    entry.window_count = 1;
                }
                if entry.window_count >= config.ident_confirm {
                    entry.confirmed = true;
                }
                entry.last_seen = seen;
            }
            None => {
                self.values.push(ObservedValue {
                    value,
                    count: 1,
                    first_seen: seen,
                    last_seen: seen,
                    window_start: seen,
                    window_count: 1,
                    confirmed: config.ident_confirm <= 1,
                });
                if self.values.len() > config.ident_cap {
                    self.evict_least_recently_seen();
                }
            }
        }
    }

    /// `Match` when the value equals a confirmed value, `Mismatch` when a
    /// value is present and conflicts with everything the store has seen,
    /// `Unknown` otherwise.
    pub fn matches<Q>(&self, value: Option<&Q>) -> AttributeMatch
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        let Some(value) = value else {
            return AttributeMatch::Unknown;
        };
        if self
            .values
            .iter()
            .any(|v| v.confirmed && v.value.borrow() == value)
        {
            AttributeMatch::Match
        } else if !self.values.is_empty() && self.values.iter().all(|v| v.value.borrow() != value)
        {
            AttributeMatch::Mismatch
        } else {
            AttributeMatch::Unknown
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &ObservedValue<T>> {
        self.values.iter()
    }

    fn evict_least_recently_seen(&mut self) {
        if let Some(stalest) = self
            .values
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.last_seen)
            .map(|(i, _)| i)
        {
            self.values.remove(stalest);
        }
    }
}

/// Per-attribute identity histories of one segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityStore {
    pub shipname: ValueHistory<String>,
    pub callsign: ValueHistory<String>,
    pub imo: ValueHistory<i32>,
    pub destination: ValueHistory<String>,
    pub length: ValueHistory<f64>,
    pub width: ValueHistory<f64>,
    pub type_class: ValueHistory<TypeClass>,
}

impl IdentityStore {
    pub fn observe(&mut self, identity: &IdentityTuple<'_>, seen: DateTime<Utc>, config: &SegmenterConfig) {
        if let Some(v) = identity.shipname {
            self.shipname.observe(v.to_string(), seen, config);
        }
        if let Some(v) = identity.callsign {
            self.callsign.observe(v.to_string(), seen, config);
        }
        if let Some(v) = identity.imo {
            self.imo.observe(v, seen, config);
        }
        if let Some(v) = identity.destination {
            self.destination.observe(v.to_string(), seen, config);
        }
        if let Some(v) = identity.length {
            self.length.observe(v, seen, config);
        }
        if let Some(v) = identity.width {
            self.width.observe(v, seen, config);
        }
        if let Some(v) = identity.type_class {
            self.type_class.observe(v, seen, config);
        }
    }

    pub fn matches(&self, identity: &IdentityTuple<'_>) -> IdentityMatch {
        IdentityMatch {
            shipname: self.shipname.matches(identity.shipname),
            callsign: self.callsign.matches(identity.callsign),
            imo: self.imo.matches(identity.imo.as_ref()),
            destination: self.destination.matches(identity.destination),
            length: self.length.matches(identity.length.as_ref()),
            width: self.width.matches(identity.width.as_ref()),
            type_class: self.type_class.matches(identity.type_class.as_ref()),
        }
    }
}

/// Per-attribute outcome of matching one message against one segment.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IdentityMatch {
    pub shipname: AttributeMatch,
    pub callsign: AttributeMatch,
    pub imo: AttributeMatch,
    pub destination: AttributeMatch,
    pub length: AttributeMatch,
    pub width: AttributeMatch,
    pub type_class: AttributeMatch,
}

impl IdentityMatch {
    /// A conflict on an attribute that names the vessel rules the segment
    /// out entirely.
    pub fn hard_mismatch(&self) -> bool {
        [self.shipname, self.callsign, self.imo].contains(&AttributeMatch::Mismatch)
    }

    /// Ranking weight of the matched naming attributes, shipname, callsign
    /// and imo weigh 3, destination weighs 1.
    pub fn weighted_matches(&self) -> u32 {
        let weigh = |m: AttributeMatch, w: u32| if m == AttributeMatch::Match { w } else { 0 };
        weigh(self.shipname, 3) + weigh(self.callsign, 3) + weigh(self.imo, 3)
            + weigh(self.destination, 1)
    }

    pub fn n_match(&self) -> u32 {
        self.all().filter(|m| *m == AttributeMatch::Match).count() as u32
    }

    pub fn n_mismatch(&self) -> u32 {
        self.all().filter(|m| *m == AttributeMatch::Mismatch).count() as u32
    }

    fn all(&self) -> impl Iterator<Item = AttributeMatch> {
        [
            self.shipname,
            self.callsign,
            self.imo,
            self.destination,
            self.length,
            self.width,
            self.type_class,
        ]
        .into_iter()
    }
}
