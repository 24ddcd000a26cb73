//! Step Functions client backed by the AWS SDK

use super::{ServiceError, StateMachineDescription, StepFunctions};
use crate::models::{
    ExecutionFailedDetails, HistoryEvent, HistoryEventType, HistoryPage, StateEnteredDetails,
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sfn::error::DisplayErrorContext;

#[derive(Clone, Debug)]
pub struct SfnClient {
    client: aws_sdk_sfn::Client,
}

impl SfnClient {
    pub fn new(client: aws_sdk_sfn::Client) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &SdkConfig) -> Self {
        Self::new(aws_sdk_sfn::Client::new(config))
    }
}

fn service_error<E>(operation: &'static str, err: E) -> ServiceError
where
    E: std::error::Error,
{
    ServiceError::new(operation, DisplayErrorContext(&err).to_string())
}

fn convert_event(event: &aws_sdk_sfn::types::HistoryEvent) -> HistoryEvent {
    HistoryEvent {
        id: event.id(),
        previous_event_id: event.previous_event_id(),
        event_type: HistoryEventType::from(event.r#type().as_str().to_string()),
        state_entered_event_details: event.state_entered_event_details().map(|details| {
            StateEnteredDetails {
                name: details.name().to_string(),
                input: details.input().map(str::to_string),
            }
        }),
        execution_failed_event_details: event.execution_failed_event_details().map(|details| {
            ExecutionFailedDetails {
                error: details.error().map(str::to_string),
                cause: details.cause().map(str::to_string),
            }
        }),
    }
}

#[async_trait]
impl StepFunctions for SfnClient {
    async fn describe_state_machine(
        &self,
        state_machine_arn: &str,
    ) -> Result<StateMachineDescription, ServiceError> {
        let output = self
            .client
            .describe_state_machine()
            .state_machine_arn(state_machine_arn)
            .send()
            .await
            .map_err(|err| service_error("DescribeStateMachine", err))?;

        Ok(StateMachineDescription {
            name: output.name().to_string(),
            role_arn: output.role_arn().to_string(),
            definition: output.definition().to_string(),
        })
    }

    async fn create_state_machine(
        &self,
        name: &str,
        definition: &str,
        role_arn: &str,
    ) -> Result<String, ServiceError> {
        let output = self
            .client
            .create_state_machine()
            .name(name)
            .definition(definition)
            .role_arn(role_arn)
            .send()
            .await
            .map_err(|err| service_error("CreateStateMachine", err))?;

        Ok(output.state_machine_arn().to_string())
    }

    async fn start_execution(
        &self,
        state_machine_arn: &str,
        input: &str,
    ) -> Result<String, ServiceError> {
        let output = self
            .client
            .start_execution()
            .state_machine_arn(state_machine_arn)
            .input(input)
            .send()
            .await
            .map_err(|err| service_error("StartExecution", err))?;

        Ok(output.execution_arn().to_string())
    }

    async fn get_execution_history(
        &self,
        execution_arn: &str,
        next_token: Option<String>,
        page_size: i32,
    ) -> Result<HistoryPage, ServiceError> {
        let output = self
            .client
            .get_execution_history()
            .execution_arn(execution_arn)
            .reverse_order(true)
            .include_execution_data(true)
            .max_results(page_size)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|err| service_error("GetExecutionHistory", err))?;

        Ok(HistoryPage {
            events: output.events().iter().map(convert_event).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }
}
