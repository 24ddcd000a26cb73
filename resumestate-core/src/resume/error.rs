//! Errors raised while recovering an execution

use crate::client::ServiceError;
use crate::models::ArnError;
use thiserror::Error;

/// Why the runtime-error cause text could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CauseParseError {
    #[error("Runtime error has no cause message")]
    MissingCause,

    #[error("Cause message has no token at position {position}: {cause}")]
    MissingToken { position: usize, cause: String },

    #[error("Cause token '{0}' does not contain an event id")]
    NoEventId(String),
}

/// Errors that abort a recovery run
#[derive(Error, Debug)]
pub enum ResumeError {
    #[error("Unable to get execution history of {execution_arn}")]
    HistoryFetch {
        execution_arn: String,
        #[source]
        source: ServiceError,
    },

    #[error("Execution history of {0} is empty")]
    HistoryUnavailable(String),

    #[error("Latest event {event_id} of {execution_arn} is not an execution failure")]
    ExecutionNotFailed {
        execution_arn: String,
        event_id: i64,
    },

    #[error("No failed task or parallel state found in history of {0}")]
    NoFailingStepFound(String),

    #[error("Malformed history of {execution_arn}: {reason}")]
    MalformedHistory {
        execution_arn: String,
        reason: String,
    },

    #[error("Could not read runtime error cause")]
    CauseParse(#[from] CauseParseError),

    #[error(transparent)]
    InvalidExecutionArn(#[from] ArnError),

    #[error("Could not get ASL definition of state machine {state_machine_arn}")]
    DefinitionFetch {
        state_machine_arn: String,
        #[source]
        source: ServiceError,
    },

    #[error("Definition of state machine {state_machine_arn} is not valid JSON")]
    DefinitionParse {
        state_machine_arn: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("State machine {0} already has a state named GoToState")]
    ReservedStateExists(String),

    #[error("Failed state '{state}' is not a top-level state of {state_machine_arn}")]
    UnknownState {
        state: String,
        state_machine_arn: String,
    },

    #[error("Resume definition has dangling transitions: {}", .0.join(", "))]
    DanglingTransitions(Vec<String>),

    #[error("Resume state machine name '{0}' exceeds 80 characters")]
    ResumeNameTooLong(String),

    #[error("Failed to create new state machine {name} with GoToState")]
    DefinitionCreate {
        name: String,
        #[source]
        source: ServiceError,
    },

    #[error("Failed to start execution of {state_machine_arn}")]
    ExecutionStart {
        state_machine_arn: String,
        #[source]
        source: ServiceError,
    },
}
