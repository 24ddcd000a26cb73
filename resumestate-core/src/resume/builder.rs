//! Resume graph builder: clone a state machine with a `GoToState` entry point.

use super::error::ResumeError;
use crate::client::StepFunctions;
use crate::models::{resume_redirect_state, StateMachineDefinition, RESUME_STATE_NAME};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Longest name Step Functions accepts for a state machine
pub const MAX_STATE_MACHINE_NAME_LEN: usize = 80;

/// Name of the resume machine: `{name}-resumeState-{YYYYmmdd-HHMM}`
pub fn resume_machine_name(original_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}-resumeState-{}",
        original_name,
        now.format("%Y%m%d-%H%M")
    )
}

/// Return a copy of `definition` whose entry point is a `GoToState` choice.
///
/// The choice restarts at the original `StartAt` when the execution input has
/// `"resuming": false` and jumps to `failed_state` otherwise. The source
/// definition is left untouched.
pub fn attach_go_to_state(
    definition: &StateMachineDefinition,
    failed_state: &str,
    state_machine_arn: &str,
) -> Result<StateMachineDefinition, ResumeError> {
    if definition.contains_state(RESUME_STATE_NAME) {
        return Err(ResumeError::ReservedStateExists(
            state_machine_arn.to_string(),
        ));
    }
    if !definition.contains_state(failed_state) {
        return Err(ResumeError::UnknownState {
            state: failed_state.to_string(),
            state_machine_arn: state_machine_arn.to_string(),
        });
    }

    let mut resumed = definition.clone();
    let original_start_at = std::mem::replace(&mut resumed.start_at, RESUME_STATE_NAME.to_string());
    resumed.states.insert(
        RESUME_STATE_NAME.to_string(),
        resume_redirect_state(&original_start_at, failed_state),
    );

    let dangling = resumed.dangling_references();
    if !dangling.is_empty() {
        return Err(ResumeError::DanglingTransitions(dangling));
    }

    Ok(resumed)
}

/// Creates resume copies of state machines
pub struct ResumeGraphBuilder {
    client: Arc<dyn StepFunctions>,
}

impl ResumeGraphBuilder {
    pub fn new(client: Arc<dyn StepFunctions>) -> Self {
        Self { client }
    }

    /// Register a resume copy of `state_machine_arn` and return the new ARN
    pub async fn build_resume_machine(
        &self,
        failed_state: &str,
        state_machine_arn: &str,
    ) -> Result<String, ResumeError> {
        self.build_resume_machine_at(failed_state, state_machine_arn, Utc::now())
            .await
    }

    /// Same as [`ResumeGraphBuilder::build_resume_machine`] with a fixed clock
    pub async fn build_resume_machine_at(
        &self,
        failed_state: &str,
        state_machine_arn: &str,
        now: DateTime<Utc>,
    ) -> Result<String, ResumeError> {
        info!(
            state = failed_state,
            state_machine_arn, "Creating new state machine with go to position from failed step"
        );

        let description = self
            .client
            .describe_state_machine(state_machine_arn)
            .await
            .map_err(|source| ResumeError::DefinitionFetch {
                state_machine_arn: state_machine_arn.to_string(),
                source,
            })?;

        let definition = StateMachineDefinition::from_json(&description.definition).map_err(
            |source| ResumeError::DefinitionParse {
                state_machine_arn: state_machine_arn.to_string(),
                source,
            },
        )?;

        let resumed = attach_go_to_state(&definition, failed_state, state_machine_arn)?;

        let name = resume_machine_name(&description.name, now);
        if name.chars().count() > MAX_STATE_MACHINE_NAME_LEN {
            return Err(ResumeError::ResumeNameTooLong(name));
        }

        let body = resumed
            .to_json()
            .map_err(|source| ResumeError::DefinitionParse {
                state_machine_arn: state_machine_arn.to_string(),
                source,
            })?;

        let new_arn = self
            .client
            .create_state_machine(&name, &body, &description.role_arn)
            .await
            .map_err(|source| ResumeError::DefinitionCreate {
                name: name.clone(),
                source,
            })?;

        info!(state_machine_arn = %new_arn, name = %name, "New state machine created");
        Ok(new_arn)
    }
}
