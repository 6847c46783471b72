use std::cmp::Ordering;

use serde::Serialize;

use crate::{
    discrepancy::{distance, discrepancy, hours, implied_speed, max_allowed_discrepancy},
    AttributeMatch, IdentityMatch, Message, MessageClass, PositionFix, Segment, SegmentId,
    SegmentKind, SegmenterConfig,
};

/// Below this elapsed time the implied-speed gate is relaxed to absorb
/// GPS jitter between near-simultaneous fixes.
const JITTER_HOURS: f64 = 1.0 / 60.0;

/// Score of one candidate segment for one message, attached to output
/// records when `collect_match_stats` is enabled.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentMatch {
    pub segment: SegmentId,
    pub kind: SegmentKind,
    pub hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discrepancy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_discrepancy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implied_speed: Option<f64>,
    pub positional_ok: bool,
    pub reported_speed_ok: bool,
    pub implied_speed_ok: bool,
    pub identity: IdentityMatch,
    pub matched_weight: u32,
    pub type_class_match: bool,
    pub noise_candidate: bool,
    pub stale: bool,
    pub eligible: bool,
}

/// What the matcher decided for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDecision {
    /// Assign to this active segment.
    Existing(SegmentId),
    /// A near-duplicate of a recent fix, emit in a terminal noise segment
    /// and leave every active segment untouched.
    Noise,
    /// No active segment is plausible, start a new one.
    NewSegment,
}

#[derive(Debug, Clone)]
pub(crate) struct Matcher {
    config: SegmenterConfig,
}

impl Matcher {
    pub(crate) fn new(config: SegmenterConfig) -> Matcher {
        Matcher { config }
    }

    /// Score `msg` against every active segment and apply the selection
    /// rules in order: hard gates, the noise check, then ranking.
    pub(crate) fn best_match(
        &self,
        msg: &Message,
        class: MessageClass,
        segments: &[Segment],
    ) -> (MatchDecision, Vec<SegmentMatch>) {
        let Some(now) = msg.timestamp else {
            return (MatchDecision::NewSegment, Vec::new());
        };
        let fix = match class {
            MessageClass::Positional => msg.position_fix(),
            _ => None,
        };

        let stats: Vec<SegmentMatch> = segments
            .iter()
            .map(|segment| self.score(segment, msg, fix.as_ref(), now))
            .collect();

        if stats
            .iter()
            .any(|stat| stat.eligible && stat.noise_candidate)
        {
            return (MatchDecision::Noise, stats);
        }

        let best = segments
            .iter()
            .zip(&stats)
            .filter(|(_, stat)| stat.eligible)
            .max_by(|(a_seg, a), (b_seg, b)| rank(a, a_seg, b, b_seg));

        match best {
            Some((segment, _)) => (MatchDecision::Existing(segment.id()), stats),
            None => (MatchDecision::NewSegment, stats),
        }
    }

    fn score(
        &self,
        segment: &Segment,
        msg: &Message,
        fix: Option<&PositionFix>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> SegmentMatch {
        let identity = segment.identity_matches(msg);
        let positional_pair = match (fix, segment.last_positional()) {
            (Some(obs), Some(prev)) => Some((prev, obs)),
            _ => None,
        };
        let elapsed = match positional_pair {
            Some((prev, _)) => hours(prev.timestamp, now),
            None => hours(segment.last_msg().timestamp, now),
        };
        let stale = elapsed > self.config.max_hours;

        let mut stat = SegmentMatch {
            segment: segment.id(),
            kind: segment.kind(),
            hours: elapsed,
            discrepancy: None,
            max_discrepancy: None,
            implied_speed: None,
            positional_ok: true,
            reported_speed_ok: true,
            implied_speed_ok: true,
            identity,
            matched_weight: identity.weighted_matches(),
            type_class_match: identity.type_class == AttributeMatch::Match,
            noise_candidate: false,
            stale,
            eligible: false,
        };

        if stale {
            return stat;
        }

        if let Some((prev, obs)) = positional_pair {
            let disc = discrepancy(prev, obs);
            let max_disc =
                max_allowed_discrepancy(elapsed, self.config.penalty_speed, self.config.buffer_nm);
            let dist = distance(prev.lat, prev.lon, obs.lat, obs.lon);
            let implied = implied_speed(dist, elapsed);
            let tolerance = if elapsed < JITTER_HOURS { 2.0 } else { 1.0 };

            stat.discrepancy = Some(disc);
            stat.max_discrepancy = Some(max_disc);
            stat.implied_speed = Some(implied);
            // NaN never exceeds a bound, an unknown value is no constraint.
            stat.positional_ok = !(disc > max_disc);
            stat.reported_speed_ok = !msg
                .speed
                .is_some_and(|s| s > self.config.max_speed * self.config.reported_speed_multiplier);
            stat.implied_speed_ok = !(implied > self.config.max_speed * tolerance);
            stat.noise_candidate =
                dist <= self.config.noise_dist && elapsed <= self.config.noise_time_hours();
        }

        stat.eligible = stat.positional_ok
            && stat.reported_speed_ok
            && stat.implied_speed_ok
            && !identity.hard_mismatch();
        stat
    }
}

/// Ranking among surviving candidates: identity weight, then transponder
/// class, then the segment the vessel was seen in most recently, then the
/// smallest discrepancy, then the earliest-born segment.
fn rank(a: &SegmentMatch, a_seg: &Segment, b: &SegmentMatch, b_seg: &Segment) -> Ordering {
    let a_last_fix = a_seg.last_positional().map(|f| f.timestamp);
    let b_last_fix = b_seg.last_positional().map(|f| f.timestamp);
    a.matched_weight
        .cmp(&b.matched_weight)
        .then(a.type_class_match.cmp(&b.type_class_match))
        .then(a_last_fix.cmp(&b_last_fix))
        .then_with(|| {
            let a_disc = a.discrepancy.unwrap_or(f64::INFINITY);
            let b_disc = b.discrepancy.unwrap_or(f64::INFINITY);
            b_disc.partial_cmp(&a_disc).unwrap_or(Ordering::Equal)
        })
        .then_with(|| b_seg.id().cmp(&a_seg.id()))
}
