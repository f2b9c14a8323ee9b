//! tagfix - audio tag encoding normalizer
//!
//! Reopens every supported audio file under a folder with a format-aware
//! tag codec and writes it back, forcing a consistent character encoding
//! and tag layout.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod normalize;
pub mod preview;
pub mod report;
pub mod scan;
