use std::time::Duration;

use serde::Deserialize;

use crate::error::{error::InvalidConfigSnafu, Result};

/// Tunables for one `Segmenter` instance. Immutable after construction,
/// see [`crate::Segmenter::new`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmenterConfig {
    /// Retire a segment when this gap since its last message is exceeded.
    pub max_hours: f64,
    /// Speed cap in knots, exceeding this is always discontinuous.
    pub max_speed: f64,
    /// Slack above `max_speed` on the reported-speed validity check.
    pub reported_speed_multiplier: f64,
    /// Distance in nautical miles below which a near-duplicate positional
    /// message is treated as noise.
    pub noise_dist: f64,
    /// Time window for the noise check.
    #[serde(with = "humantime_serde")]
    pub noise_time: Duration,
    /// Base rate in knots for allowed discrepancy growth with elapsed time.
    pub penalty_speed: f64,
    /// Floor in nautical miles on the allowed discrepancy.
    pub buffer_nm: f64,
    /// Observations required to confirm an identity value.
    pub ident_confirm: u32,
    /// Window within which `ident_confirm` observations confirm a value.
    #[serde(with = "humantime_serde")]
    pub ident_window: Duration,
    /// Per-segment identity-store entries, LRU evicted beyond this.
    pub ident_cap: usize,
    /// Output field name carrying the segment id.
    pub segment_field: String,
    /// Attach diagnostic match records to output messages.
    pub collect_match_stats: bool,
    /// Upper bound on concurrently active segments, the segment with the
    /// oldest last message is retired first when exceeded.
    pub max_open_segments: usize,
    /// Retain the ids of all assigned messages on each segment instead of
    /// only the rolling summaries.
    pub retain_messages: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        SegmenterConfig {
            max_hours: 24.0,
            max_speed: 30.0,
            reported_speed_multiplier: 1.1,
            noise_dist: 0.1,
            noise_time: Duration::from_secs(5 * 60),
            penalty_speed: 12.0,
            buffer_nm: 1.0,
            ident_confirm: 2,
            ident_window: Duration::from_secs(15 * 60),
            ident_cap: 32,
            segment_field: "segment".to_string(),
            collect_match_stats: false,
            max_open_segments: 100,
            retain_messages: false,
        }
    }
}

impl SegmenterConfig {
    pub fn validate(&self) -> Result<()> {
        positive("max_hours", self.max_hours)?;
        positive("max_speed", self.max_speed)?;
        positive("penalty_speed", self.penalty_speed)?;

        non_negative("noise_dist", self.noise_dist)?;
        non_negative("buffer_nm", self.buffer_nm)?;

        if self.reported_speed_multiplier < 1.0 || !self.reported_speed_multiplier.is_finite() {
            return InvalidConfigSnafu {
                option: "reported_speed_multiplier",
                reason: format!("must be at least 1.0, got {}", self.reported_speed_multiplier),
            }
            .fail();
        }
        if self.ident_confirm == 0 {
            return InvalidConfigSnafu {
                option: "ident_confirm",
                reason: "must be at least 1".to_string(),
            }
            .fail();
        }
        if self.ident_cap == 0 {
            return InvalidConfigSnafu {
                option: "ident_cap",
                reason: "must be at least 1".to_string(),
            }
            .fail();
        }
        if self.max_open_segments == 0 {
            return InvalidConfigSnafu {
                option: "max_open_segments",
                reason: "must be at least 1".to_string(),
            }
            .fail();
        }
        if self.segment_field.is_empty() {
            return InvalidConfigSnafu {
                option: "segment_field",
                reason: "must not be empty".to_string(),
            }
            .fail();
        }

        Ok(())
    }

    pub(crate) fn noise_time_hours(&self) -> f64 {
        self.noise_time.as_secs_f64() / 3600.0
    }
}

fn positive(option: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        InvalidConfigSnafu {
            option,
            reason: format!("must be a positive number, got {value}"),
        }
        .fail()
    }
}

fn non_negative(option: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        InvalidConfigSnafu {
            option,
            reason: format!("must be a non-negative number, got {value}"),
        }
        .fail()
    }
}
