//! Process-wide services

pub mod logging;

pub use logging::*;
