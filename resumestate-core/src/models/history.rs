//! Execution history data structures

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event types the failure locator cares about. Everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HistoryEventType {
    TaskStateEntered,
    ParallelStateEntered,
    ParallelStateFailed,
    ExecutionFailed,
    Other(String),
}

impl From<String> for HistoryEventType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "TaskStateEntered" => HistoryEventType::TaskStateEntered,
            "ParallelStateEntered" => HistoryEventType::ParallelStateEntered,
            "ParallelStateFailed" => HistoryEventType::ParallelStateFailed,
            "ExecutionFailed" => HistoryEventType::ExecutionFailed,
            _ => HistoryEventType::Other(value),
        }
    }
}

impl From<HistoryEventType> for String {
    fn from(value: HistoryEventType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for HistoryEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryEventType::TaskStateEntered => write!(f, "TaskStateEntered"),
            HistoryEventType::ParallelStateEntered => write!(f, "ParallelStateEntered"),
            HistoryEventType::ParallelStateFailed => write!(f, "ParallelStateFailed"),
            HistoryEventType::ExecutionFailed => write!(f, "ExecutionFailed"),
            HistoryEventType::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Details attached to `...StateEntered` events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEnteredDetails {
    pub name: String,
    /// Raw JSON input of the state, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

/// Details attached to the terminal `ExecutionFailed` event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionFailedDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

/// One record of an execution history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    pub id: i64,
    #[serde(default)]
    pub previous_event_id: i64,
    #[serde(rename = "type")]
    pub event_type: HistoryEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_entered_event_details: Option<StateEnteredDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_failed_event_details: Option<ExecutionFailedDetails>,
}

/// One page of history as returned by the orchestration service, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub events: Vec<HistoryEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// The step an execution failed at, with the input it was entered with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedStep {
    pub name: String,
    pub input: Option<String>,
}
