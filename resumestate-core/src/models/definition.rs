//! Amazon States Language definition model

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Reserved name of the injected entry state
pub const RESUME_STATE_NAME: &str = "GoToState";

/// Input path checked by the injected entry state
pub const RESUMING_FLAG_PATH: &str = "$.resuming";

const START_AT_KEY: &str = "StartAt";
const STATES_KEY: &str = "States";

/// Why a JSON object is not a state machine definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("definition has no {0} field")]
    MissingField(&'static str),

    #[error("definition field {field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// A state machine definition.
///
/// Only `StartAt` and `States` are typed; every other top-level field and the
/// body of every state are carried as raw JSON. The positions of the two typed
/// fields among the top-level keys are remembered, so serializing reproduces
/// the source key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "Map<String, Value>",
    into = "Map<String, Value>"
)]
pub struct StateMachineDefinition {
    pub start_at: String,
    pub states: Map<String, Value>,
    pub extra: Map<String, Value>,
    start_at_position: usize,
    states_position: usize,
}

impl TryFrom<Map<String, Value>> for StateMachineDefinition {
    type Error = DefinitionError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut start_at = None;
        let mut states = None;
        let mut extra = Map::new();

        for (position, (key, value)) in fields.into_iter().enumerate() {
            match key.as_str() {
                START_AT_KEY => match value {
                    Value::String(name) => start_at = Some((position, name)),
                    _ => {
                        return Err(DefinitionError::WrongType {
                            field: START_AT_KEY,
                            expected: "a string",
                        })
                    }
                },
                STATES_KEY => match value {
                    Value::Object(map) => states = Some((position, map)),
                    _ => {
                        return Err(DefinitionError::WrongType {
                            field: STATES_KEY,
                            expected: "an object",
                        })
                    }
                },
                _ => {
                    extra.insert(key, value);
                }
            }
        }

        let (start_at_position, start_at) =
            start_at.ok_or(DefinitionError::MissingField(START_AT_KEY))?;
        let (states_position, states) = states.ok_or(DefinitionError::MissingField(STATES_KEY))?;

        Ok(Self {
            start_at,
            states,
            extra,
            start_at_position,
            states_position,
        })
    }
}

impl From<StateMachineDefinition> for Map<String, Value> {
    fn from(definition: StateMachineDefinition) -> Self {
        let mut typed = [
            (
                definition.start_at_position,
                START_AT_KEY,
                Value::String(definition.start_at),
            ),
            (
                definition.states_position,
                STATES_KEY,
                Value::Object(definition.states),
            ),
        ];
        typed.sort_by_key(|(position, _, _)| *position);

        let mut fields = Map::new();
        let mut typed = typed.into_iter().peekable();
        let mut extra = definition.extra.into_iter();
        loop {
            if let Some((_, key, value)) = typed.next_if(|(position, _, _)| *position <= fields.len()) {
                fields.insert(key.to_string(), value);
            } else if let Some((key, value)) = extra.next() {
                fields.insert(key, value);
            } else if let Some((_, key, value)) = typed.next() {
                fields.insert(key.to_string(), value);
            } else {
                break;
            }
        }
        fields
    }
}

impl StateMachineDefinition {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn contains_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// Transition targets of the top-level states that do not name a top-level state.
    ///
    /// Nested `Parallel` branches and `Map` iterators own their own `States`
    /// and are not inspected.
    pub fn dangling_references(&self) -> Vec<String> {
        let mut dangling = Vec::new();

        if !self.contains_state(&self.start_at) {
            dangling.push(format!("StartAt -> {}", self.start_at));
        }

        for (state_name, state) in &self.states {
            for target in transition_targets(state) {
                if !self.contains_state(target) {
                    dangling.push(format!("{} -> {}", state_name, target));
                }
            }
        }

        dangling
    }
}

/// `Next`, `Default` and `Choices[].Next` of a single state
fn transition_targets(state: &Value) -> Vec<&str> {
    let mut targets = Vec::new();

    for key in ["Next", "Default"] {
        if let Some(target) = state.get(key).and_then(Value::as_str) {
            targets.push(target);
        }
    }

    if let Some(choices) = state.get("Choices").and_then(Value::as_array) {
        targets.extend(
            choices
                .iter()
                .filter_map(|choice| choice.get("Next").and_then(Value::as_str)),
        );
    }

    targets
}

/// Build the entry `Choice` state: restart at `original_start` when the
/// execution input carries `"resuming": false`, otherwise jump to `failed_step`.
pub fn resume_redirect_state(original_start: &str, failed_step: &str) -> Value {
    json!({
        "Type": "Choice",
        "Choices": [
            {
                "Variable": RESUMING_FLAG_PATH,
                "BooleanEquals": false,
                "Next": original_start
            }
        ],
        "Default": failed_step
    })
}
