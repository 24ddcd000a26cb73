//! Clients for the AWS services a recovery run talks to.
//!
//! Every service is reached through a narrow trait so the triage and
//! resume logic can run against in-memory fakes.

use crate::models::HistoryPage;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use thiserror::Error;

pub mod sfn;

pub use sfn::SfnClient;

/// Largest page the history API hands out
pub const MAX_HISTORY_PAGE_SIZE: i32 = 1000;

/// Load region and credentials from the standard AWS environment
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

/// A failed call to an external service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct ServiceError {
    pub operation: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// What `DescribeStateMachine` returns that a recovery run needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachineDescription {
    pub name: String,
    pub role_arn: String,
    /// Definition as JSON text
    pub definition: String,
}

/// The subset of the Step Functions API used to recover an execution
#[async_trait]
pub trait StepFunctions: Send + Sync {
    async fn describe_state_machine(
        &self,
        state_machine_arn: &str,
    ) -> Result<StateMachineDescription, ServiceError>;

    /// Register a new state machine and return its ARN
    async fn create_state_machine(
        &self,
        name: &str,
        definition: &str,
        role_arn: &str,
    ) -> Result<String, ServiceError>;

    /// Start an execution and return its ARN
    async fn start_execution(
        &self,
        state_machine_arn: &str,
        input: &str,
    ) -> Result<String, ServiceError>;

    /// Fetch one page of history, newest event first.
    ///
    /// `next_token` is `None` for the first page.
    async fn get_execution_history(
        &self,
        execution_arn: &str,
        next_token: Option<String>,
        page_size: i32,
    ) -> Result<HistoryPage, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sdk_config_uses_latest_behavior_version() {
        let config = load_sdk_config().await;
        assert_eq!(config.behavior_version(), Some(BehaviorVersion::latest()));
    }
}
