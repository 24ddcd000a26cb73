//! Step Functions ARN helpers

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArnError {
    #[error("Not a standard execution ARN: {0}")]
    NotAnExecutionArn(String),
}

/// Derive the state machine ARN that owns an execution.
///
/// `arn:aws:states:us-east-1:123:execution:MyMachine:exec1` becomes
/// `arn:aws:states:us-east-1:123:stateMachine:MyMachine`.
pub fn state_machine_arn_from_execution_arn(execution_arn: &str) -> Result<String, ArnError> {
    let mut parts: Vec<&str> = execution_arn.split(':').collect();

    // arn, partition, service, region, account, resource type, machine, execution
    if parts.len() != 8 || parts[0] != "arn" || parts[5] != "execution" {
        return Err(ArnError::NotAnExecutionArn(execution_arn.to_string()));
    }

    parts.pop();
    parts[5] = "stateMachine";
    Ok(parts.join(":"))
}
