//! # Resumestate Core Library
//!
//! Locates the state a failed Step Functions execution stopped at, registers a
//! copy of its state machine that can jump straight to that state, and starts
//! it. Also carries the date and query helpers shared by batch jobs.

pub mod client;
pub mod models;
pub mod resume;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use client::{ServiceError, StepFunctions};
pub use models::*;
pub use resume::{resume_failed_execution, ResumeError, ResumeReport};
