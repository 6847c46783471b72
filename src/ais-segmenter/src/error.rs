use snafu::{Location, Snafu};
use tokio_util::codec::LinesCodecError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to open '{path}'"))]
    OpenFile {
        #[snafu(implicit)]
        location: Location,
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read from the input stream"))]
    ReadInput {
        #[snafu(implicit)]
        location: Location,
        source: LinesCodecError,
    },
    #[snafu(display("Failed to write an output record"))]
    WriteOutput {
        #[snafu(implicit)]
        location: Location,
        source: std::io::Error,
    },
    #[snafu(display("Malformed input record on line {line}"))]
    MalformedRecord {
        #[snafu(implicit)]
        location: Location,
        line: u64,
        source: serde_json::Error,
    },
    #[snafu(display("Failed to segment a message"))]
    Segmentation {
        #[snafu(implicit)]
        location: Location,
        source: segment_core::Error,
    },
    #[snafu(display("Failed to read the state file '{path}'"))]
    ReadState {
        #[snafu(implicit)]
        location: Location,
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to parse the state file '{path}'"))]
    ParseState {
        #[snafu(implicit)]
        location: Location,
        path: String,
        source: serde_json::Error,
    },
    #[snafu(display("Failed to encode state for the state file '{path}'"))]
    EncodeState {
        #[snafu(implicit)]
        location: Location,
        path: String,
        source: serde_json::Error,
    },
    #[snafu(display("Failed to write the state file '{path}'"))]
    WriteState {
        #[snafu(implicit)]
        location: Location,
        path: String,
        source: std::io::Error,
    },
}
