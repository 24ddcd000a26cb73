//! Start the resume execution

use super::error::ResumeError;
use crate::client::StepFunctions;
use serde_json::json;
use tracing::info;

/// Input of every resume execution
pub fn resume_input() -> String {
    json!({ "resuming": true }).to_string()
}

/// Start `state_machine_arn` with `{"resuming": true}` and return the execution ARN
pub async fn start_resume_execution(
    client: &dyn StepFunctions,
    state_machine_arn: &str,
) -> Result<String, ResumeError> {
    info!(state_machine_arn, "Starting execution of new state machine");

    let execution_arn = client
        .start_execution(state_machine_arn, &resume_input())
        .await
        .map_err(|source| ResumeError::ExecutionStart {
            state_machine_arn: state_machine_arn.to_string(),
            source,
        })?;

    info!(execution_arn = %execution_arn, "Resume execution started");
    Ok(execution_arn)
}
