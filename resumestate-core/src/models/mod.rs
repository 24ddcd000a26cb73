//! Data models for resumestate

pub mod arn;
pub mod configuration;
pub mod definition;
pub mod history;

pub use arn::*;
pub use configuration::*;
pub use definition::*;
pub use history::*;
