//! Access-log scanner for the NCSA common and combined log formats.
//!
//! The core is a hand-written, position-tracking line parser ([`parse`])
//! producing one [`entry::Entry`] per log line. Around it sit the status
//! aggregator ([`stats`]), the per-metric run checkpoint ([`checkpoint`]) and
//! the command-line driver ([`cli`]).

pub mod checkpoint;
pub mod cli;
pub mod cursor;
pub mod entry;
pub mod error;
pub mod parse;
pub mod request;
pub mod stats;
