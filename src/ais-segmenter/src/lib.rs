#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Thin IO layer around `segment-core`. Reads a time-sorted stream of
//! newline-delimited JSON AIS records, feeds them to one segmenter per
//! ssvid and writes every record back out tagged with its segment id.

pub mod error;
pub mod settings;
pub mod startup;
