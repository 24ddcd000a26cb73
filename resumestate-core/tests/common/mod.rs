//! In-memory Step Functions fake shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use resumestate_core::client::{ServiceError, StateMachineDescription, StepFunctions};
use resumestate_core::models::{HistoryEvent, HistoryPage};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

pub const EXECUTION_ARN: &str = "arn:aws:states:us-east-1:123:execution:Nightly:run-42";
pub const STATE_MACHINE_ARN: &str = "arn:aws:states:us-east-1:123:stateMachine:Nightly";
pub const ROLE_ARN: &str = "arn:aws:iam::123:role/nightly-sfn";

#[derive(Debug, Clone, PartialEq)]
pub struct CreateCall {
    pub name: String,
    pub definition: String,
    pub role_arn: String,
}

#[derive(Default)]
pub struct FakeStepFunctions {
    /// Full history, newest first; served in pages of the requested size
    pub history: Vec<HistoryEvent>,
    pub machines: HashMap<String, StateMachineDescription>,
    pub fail_history: bool,
    pub fail_create: bool,
    pub fail_start: bool,
    pub history_calls: Mutex<usize>,
    pub created: Mutex<Vec<CreateCall>>,
    pub started: Mutex<Vec<(String, String)>>,
}

impl FakeStepFunctions {
    pub fn with_history(history: Vec<HistoryEvent>) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn with_machine(mut self, arn: &str, name: &str, definition: &Value) -> Self {
        self.machines.insert(
            arn.to_string(),
            StateMachineDescription {
                name: name.to_string(),
                role_arn: ROLE_ARN.to_string(),
                definition: definition.to_string(),
            },
        );
        self
    }

    pub fn history_calls(&self) -> usize {
        *self.history_calls.lock().unwrap()
    }

    pub fn created(&self) -> Vec<CreateCall> {
        self.created.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<(String, String)> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl StepFunctions for FakeStepFunctions {
    async fn describe_state_machine(
        &self,
        state_machine_arn: &str,
    ) -> Result<StateMachineDescription, ServiceError> {
        self.machines.get(state_machine_arn).cloned().ok_or_else(|| {
            ServiceError::new(
                "DescribeStateMachine",
                format!("StateMachineDoesNotExist: {}", state_machine_arn),
            )
        })
    }

    async fn create_state_machine(
        &self,
        name: &str,
        definition: &str,
        role_arn: &str,
    ) -> Result<String, ServiceError> {
        if self.fail_create {
            return Err(ServiceError::new(
                "CreateStateMachine",
                "StateMachineAlreadyExists",
            ));
        }

        self.created.lock().unwrap().push(CreateCall {
            name: name.to_string(),
            definition: definition.to_string(),
            role_arn: role_arn.to_string(),
        });
        Ok(format!("arn:aws:states:us-east-1:123:stateMachine:{}", name))
    }

    async fn start_execution(
        &self,
        state_machine_arn: &str,
        input: &str,
    ) -> Result<String, ServiceError> {
        if self.fail_start {
            return Err(ServiceError::new("StartExecution", "ExecutionLimitExceeded"));
        }

        self.started
            .lock()
            .unwrap()
            .push((state_machine_arn.to_string(), input.to_string()));
        Ok(format!(
            "{}:resume-1",
            state_machine_arn.replace(":stateMachine:", ":execution:")
        ))
    }

    async fn get_execution_history(
        &self,
        _execution_arn: &str,
        next_token: Option<String>,
        page_size: i32,
    ) -> Result<HistoryPage, ServiceError> {
        *self.history_calls.lock().unwrap() += 1;
        if self.fail_history {
            return Err(ServiceError::new("GetExecutionHistory", "AccessDenied"));
        }

        let start: usize = next_token.map(|t| t.parse().unwrap()).unwrap_or(0);
        let end = (start + page_size as usize).min(self.history.len());
        let events = self.history[start..end].to_vec();
        let next_token = (end < self.history.len()).then(|| end.to_string());

        Ok(HistoryPage { events, next_token })
    }
}

/// Build a newest-first history from forward-ordered `(type, name, previous_event_id)`
/// entries. Ids are assigned 1..=n in forward order.
pub fn history(entries: &[(&str, Option<&str>, i64)]) -> Vec<HistoryEvent> {
    let mut events: Vec<HistoryEvent> = entries
        .iter()
        .enumerate()
        .map(|(index, (event_type, name, previous))| {
            let mut event = json!({
                "id": index as i64 + 1,
                "previousEventId": previous,
                "type": event_type,
            });
            if let Some(name) = name {
                event["stateEnteredEventDetails"] = json!({
                    "name": name,
                    "input": format!("{{\"step\":\"{}\"}}", name),
                });
            }
            serde_json::from_value(event).unwrap()
        })
        .collect();
    events.reverse();
    events
}

/// Attach failure details to the head (newest) event
pub fn fail_head(mut events: Vec<HistoryEvent>, error: &str, cause: &str) -> Vec<HistoryEvent> {
    events[0].execution_failed_event_details = Some(
        serde_json::from_value(json!({"error": error, "cause": cause})).unwrap(),
    );
    events
}

/// A task `Extract` that succeeds, then a task `Load` that fails
pub fn task_failure_history() -> Vec<HistoryEvent> {
    fail_head(
        history(&[
            ("ExecutionStarted", None, 0),
            ("TaskStateEntered", Some("Extract"), 1),
            ("TaskScheduled", None, 2),
            ("TaskStarted", None, 3),
            ("TaskSucceeded", None, 4),
            ("TaskStateExited", None, 5),
            ("TaskStateEntered", Some("Load"), 6),
            ("TaskScheduled", None, 7),
            ("TaskStarted", None, 8),
            ("TaskFailed", None, 9),
            ("ExecutionFailed", None, 10),
        ]),
        "States.TaskFailed",
        "lambda returned an error",
    )
}

pub fn source_definition() -> Value {
    json!({
        "Comment": "nightly load",
        "StartAt": "Extract",
        "States": {
            "Extract": {
                "Type": "Task",
                "Resource": "arn:aws:lambda:us-east-1:123:function:extract",
                "Next": "Load"
            },
            "Load": {
                "Type": "Task",
                "Resource": "arn:aws:lambda:us-east-1:123:function:load",
                "End": true
            }
        }
    })
}
