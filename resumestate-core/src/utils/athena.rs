//! Athena-backed [`QueryRunner`]

use super::query::QueryRunner;
use crate::client::ServiceError;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_athena::error::DisplayErrorContext;
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

fn service_error<E>(operation: &'static str, err: E) -> ServiceError
where
    E: std::error::Error,
{
    ServiceError::new(operation, DisplayErrorContext(&err).to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryProgress {
    Running,
    Succeeded,
    /// Failed or cancelled
    Stopped,
}

/// Map a polled state; a missing or unrecognised state ends the poll with an error
fn query_progress(state: Option<&QueryExecutionState>) -> Result<QueryProgress, ServiceError> {
    match state {
        Some(QueryExecutionState::Queued) | Some(QueryExecutionState::Running) => {
            Ok(QueryProgress::Running)
        }
        Some(QueryExecutionState::Succeeded) => Ok(QueryProgress::Succeeded),
        Some(QueryExecutionState::Failed) | Some(QueryExecutionState::Cancelled) => {
            Ok(QueryProgress::Stopped)
        }
        Some(other) => Err(ServiceError::new(
            "GetQueryExecution",
            format!("unexpected query state {}", other.as_str()),
        )),
        None => Err(ServiceError::new(
            "GetQueryExecution",
            "no query state returned",
        )),
    }
}

/// Starts an Athena query and polls it until it reaches a terminal state
#[derive(Clone, Debug)]
pub struct AthenaQueryRunner {
    client: aws_sdk_athena::Client,
    database: Option<String>,
    output_location: Option<String>,
    work_group: Option<String>,
    poll_interval: Duration,
}

impl AthenaQueryRunner {
    pub fn new(client: aws_sdk_athena::Client) -> Self {
        Self {
            client,
            database: None,
            output_location: None,
            work_group: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn from_conf(config: &SdkConfig) -> Self {
        Self::new(aws_sdk_athena::Client::new(config))
    }

    pub fn with_database(mut self, database: Option<String>) -> Self {
        self.database = database;
        self
    }

    /// `s3://` prefix results are written under; the work group default otherwise
    pub fn with_output_location(mut self, output_location: Option<String>) -> Self {
        self.output_location = output_location;
        self
    }

    pub fn with_work_group(mut self, work_group: Option<String>) -> Self {
        self.work_group = work_group;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[async_trait]
impl QueryRunner for AthenaQueryRunner {
    async fn run_query(
        &self,
        query: &str,
        job_name: &str,
    ) -> Result<Option<String>, ServiceError> {
        let mut request = self
            .client
            .start_query_execution()
            .query_string(query)
            .set_work_group(self.work_group.clone());
        if let Some(database) = &self.database {
            request = request.query_execution_context(
                QueryExecutionContext::builder().database(database).build(),
            );
        }
        if let Some(output_location) = &self.output_location {
            request = request.result_configuration(
                ResultConfiguration::builder()
                    .output_location(output_location)
                    .build(),
            );
        }

        let started = request
            .send()
            .await
            .map_err(|err| service_error("StartQueryExecution", err))?;
        let query_execution_id = started
            .query_execution_id()
            .ok_or_else(|| {
                ServiceError::new("StartQueryExecution", "no query execution id returned")
            })?
            .to_string();
        info!(job_name, query_execution_id = %query_execution_id, "query started");

        loop {
            let output = self
                .client
                .get_query_execution()
                .query_execution_id(&query_execution_id)
                .send()
                .await
                .map_err(|err| service_error("GetQueryExecution", err))?;

            let execution = output.query_execution();
            let status = execution.and_then(|execution| execution.status());
            let state = status.and_then(|status| status.state());
            match query_progress(state)? {
                QueryProgress::Succeeded => {
                    info!(job_name, query_execution_id = %query_execution_id, "query result id");
                    return Ok(execution
                        .and_then(|execution| execution.result_configuration())
                        .and_then(|config| config.output_location())
                        .map(str::to_string));
                }
                QueryProgress::Stopped => {
                    warn!(
                        job_name,
                        query_execution_id = %query_execution_id,
                        reason = status
                            .and_then(|status| status.state_change_reason())
                            .unwrap_or(""),
                        "query did not succeed"
                    );
                    return Ok(None);
                }
                QueryProgress::Running => {
                    debug!(job_name, state = ?state, "query still running");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }
}
