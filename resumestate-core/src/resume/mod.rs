//! Failure triage and resume-machine construction.
//!
//! A recovery run chains three steps: locate the failed state in the execution
//! history, register a copy of the state machine that can jump to it, and start
//! that copy with `{"resuming": true}`. Every step fails fast; nothing is
//! retried or cleaned up.

pub mod builder;
pub mod cause;
pub mod error;
pub mod locator;
pub mod trigger;

pub use builder::*;
pub use cause::*;
pub use error::*;
pub use locator::*;
pub use trigger::*;

use crate::client::StepFunctions;
use crate::models::state_machine_arn_from_execution_arn;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Outcome of a recovery run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeReport {
    pub failed_execution_arn: String,
    pub failed_state: String,
    pub failed_input: Option<String>,
    pub source_state_machine_arn: String,
    pub resume_state_machine_arn: String,
    pub resume_execution_arn: String,
}

/// Recover `execution_arn`: find where it failed, build the resume machine and start it
pub async fn resume_failed_execution(
    client: Arc<dyn StepFunctions>,
    execution_arn: &str,
) -> Result<ResumeReport, ResumeError> {
    let source_state_machine_arn = state_machine_arn_from_execution_arn(execution_arn)?;

    let failed = FailureLocator::new(client.clone())
        .locate_failure(execution_arn)
        .await?;

    let resume_state_machine_arn = ResumeGraphBuilder::new(client.clone())
        .build_resume_machine(&failed.name, &source_state_machine_arn)
        .await?;
    info!(
        state = %failed.name,
        input = failed.input.as_deref().unwrap_or(""),
        "Execution had failed at state"
    );

    let resume_execution_arn =
        start_resume_execution(client.as_ref(), &resume_state_machine_arn).await?;

    Ok(ResumeReport {
        failed_execution_arn: execution_arn.to_string(),
        failed_state: failed.name,
        failed_input: failed.input,
        source_state_machine_arn,
        resume_state_machine_arn,
        resume_execution_arn,
    })
}
