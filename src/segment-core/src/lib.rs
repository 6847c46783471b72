#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Partitions a per-vessel stream of decoded AIS messages into maximal
//! continuous tracks, called segments. A single MMSI is frequently shared
//! by several real vessels at once, so each incoming message is scored
//! against every active segment on expected kinematics and on the
//! identities the segment has confirmed, and is assigned to exactly one
//! segment or emitted in a terminal bad or noise segment.

mod config;
pub mod discrepancy;
pub mod error;
mod identity;
mod matcher;
mod message;
mod segment;
mod segmenter;
mod state;

pub use config::*;
pub use error::*;
pub use identity::*;
pub use matcher::{MatchDecision, SegmentMatch};
pub use message::*;
pub use segment::*;
pub use segmenter::*;
pub use state::*;
