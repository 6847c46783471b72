use chrono::{DateTime, Utc};
use snafu::{Location, Snafu};

use crate::Ssvid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display(
        "input for ssvid '{ssvid}' is unsorted, got timestamp '{current}' after '{previous}'"
    ))]
    UnsortedInput {
        #[snafu(implicit)]
        location: Location,
        ssvid: Ssvid,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
    #[snafu(display("message ssvid '{got}' does not match segmenter ssvid '{expected}'"))]
    SsvidMismatch {
        #[snafu(implicit)]
        location: Location,
        expected: Ssvid,
        got: Ssvid,
    },
    #[snafu(display("invalid value for option '{option}': {reason}"))]
    InvalidConfig {
        #[snafu(implicit)]
        location: Location,
        option: &'static str,
        reason: String,
    },
    #[snafu(display("'{value}' is not a valid segment id"))]
    InvalidSegmentId {
        #[snafu(implicit)]
        location: Location,
        value: String,
    },
    #[snafu(display("Failed to serialize an output record"))]
    Serialization {
        #[snafu(implicit)]
        location: Location,
        source: serde_json::Error,
    },
}
