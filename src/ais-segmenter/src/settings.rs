use std::path::PathBuf;

use clap::Parser;
use segment_core::SegmenterConfig;

/// Group time-sorted AIS messages into continuous track segments.
///
/// Reads newline-delimited JSON records, runs one segmenter per ssvid and
/// writes each record back out tagged with its segment id.
#[derive(Debug, Parser)]
#[command(name = "ais-segmenter", version)]
pub struct Settings {
    /// Newline-delimited JSON input, '-' reads stdin.
    pub infile: String,
    /// Output path, '-' writes stdout.
    pub outfile: String,
    /// Only segment this ssvid, messages for other ssvids are dropped.
    #[arg(long)]
    pub ssvid: Option<i32>,
    /// Segments with a larger gap since their last message are retired.
    #[arg(long)]
    pub max_hours: Option<f64>,
    /// Maximum allowable speed between points, in knots.
    #[arg(long)]
    pub max_speed: Option<f64>,
    /// Distance in nautical miles under which a near-duplicate position is
    /// emitted as noise.
    #[arg(long)]
    pub noise_dist: Option<f64>,
    /// Base rate in knots for allowed discrepancy growth over time.
    #[arg(long)]
    pub penalty_speed: Option<f64>,
    /// Floor in nautical miles on the allowed discrepancy.
    #[arg(long)]
    pub buffer_nm: Option<f64>,
    /// Add the segment id to this field when writing records.
    #[arg(long)]
    pub segment_field: Option<String>,
    /// Attach per-segment match diagnostics to every output record.
    #[arg(long)]
    pub collect_match_stats: bool,
    /// Resume from segmenter states saved by a previous run.
    #[arg(long)]
    pub load_state: Option<PathBuf>,
    /// Save segmenter states on exit instead of retiring open segments,
    /// for processing the stream in chunks.
    #[arg(long)]
    pub save_state: Option<PathBuf>,
}

impl Settings {
    pub fn segmenter_config(&self) -> SegmenterConfig {
        let mut config = SegmenterConfig::default();
        if let Some(v) = self.max_hours {
            config.max_hours = v;
        }
        if let Some(v) = self.max_speed {
            config.max_speed = v;
        }
        if let Some(v) = self.noise_dist {
            config.noise_dist = v;
        }
        if let Some(v) = self.penalty_speed {
            config.penalty_speed = v;
        }
        if let Some(v) = self.buffer_nm {
            config.buffer_nm = v;
        }
        if let Some(v) = &self.segment_field {
            config.segment_field = v.clone();
        }
        config.collect_match_stats = self.collect_match_stats;
        config
    }
}
