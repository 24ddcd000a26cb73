//! Failure locator: find the state an execution failed at.
//!
//! The history is read newest first. Event ids grow by one per event in the
//! forward timeline, so in a complete reverse-ordered history the event with
//! id `i` sits at position `head_id - i`. The walk follows `previousEventId`
//! back-links through that mapping instead of chasing pointers.

use super::cause::{parse_runtime_error_event_id, RUNTIME_ERROR};
use super::error::{CauseParseError, ResumeError};
use crate::client::{StepFunctions, MAX_HISTORY_PAGE_SIZE};
use crate::models::{FailedStep, HistoryEvent, HistoryEventType};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Position of event `id` in a reverse-ordered history whose head has `head_id`.
///
/// Returns `None` for ids outside `1..=head_id`.
pub fn position_of(head_id: i64, id: i64) -> Option<usize> {
    if id < 1 || id > head_id {
        return None;
    }
    usize::try_from(head_id - id).ok()
}

/// Pages of history loaded so far, viewed as one flat newest-first sequence
struct HistoryCursor<'a> {
    client: &'a dyn StepFunctions,
    execution_arn: &'a str,
    page_size: i32,
    events: Vec<HistoryEvent>,
    next_token: Option<String>,
    pages_loaded: usize,
}

impl<'a> HistoryCursor<'a> {
    async fn open(
        client: &'a dyn StepFunctions,
        execution_arn: &'a str,
        page_size: i32,
    ) -> Result<HistoryCursor<'a>, ResumeError> {
        let mut cursor = Self {
            client,
            execution_arn,
            page_size,
            events: Vec::new(),
            next_token: None,
            pages_loaded: 0,
        };

        cursor.load_page().await?;
        if cursor.events.is_empty() {
            return Err(ResumeError::HistoryUnavailable(execution_arn.to_string()));
        }

        Ok(cursor)
    }

    async fn load_page(&mut self) -> Result<(), ResumeError> {
        let page = self
            .client
            .get_execution_history(self.execution_arn, self.next_token.take(), self.page_size)
            .await
            .map_err(|source| ResumeError::HistoryFetch {
                execution_arn: self.execution_arn.to_string(),
                source,
            })?;

        self.pages_loaded += 1;
        debug!(
            execution_arn = self.execution_arn,
            page = self.pages_loaded,
            events = page.events.len(),
            has_more = page.next_token.is_some(),
            "History page fetched"
        );

        self.events.extend(page.events);
        self.next_token = page.next_token;
        Ok(())
    }

    fn head(&self) -> &HistoryEvent {
        &self.events[0]
    }

    fn malformed(&self, reason: String) -> ResumeError {
        ResumeError::MalformedHistory {
            execution_arn: self.execution_arn.to_string(),
            reason,
        }
    }

    /// The event with the given id, fetching further pages when it lies beyond
    /// the ones loaded so far.
    async fn event(&mut self, id: i64) -> Result<&HistoryEvent, ResumeError> {
        let head_id = self.head().id;
        let position = position_of(head_id, id)
            .ok_or_else(|| self.malformed(format!("event id {} outside 1..={}", id, head_id)))?;

        while position >= self.events.len() {
            if self.next_token.is_none() {
                return Err(self.malformed(format!(
                    "event id {} not found in {} loaded events",
                    id,
                    self.events.len()
                )));
            }
            // Ids are assumed contiguous across page boundaries.
            warn!(
                execution_arn = self.execution_arn,
                event_id = id,
                page = self.pages_loaded + 1,
                "Failure walk crosses into a later history page"
            );
            self.load_page().await?;
        }

        let found = self.events[position].id;
        if found != id {
            return Err(self.malformed(format!(
                "expected event id {} at position {}, found {}",
                id, position, found
            )));
        }

        Ok(&self.events[position])
    }
}

/// Finds the state a failed execution should be resumed from
pub struct FailureLocator {
    client: Arc<dyn StepFunctions>,
    page_size: i32,
}

impl FailureLocator {
    pub fn new(client: Arc<dyn StepFunctions>) -> Self {
        Self {
            client,
            page_size: MAX_HISTORY_PAGE_SIZE,
        }
    }

    /// Use a smaller history page size; values are clamped to `1..=1000`
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size.clamp(1, MAX_HISTORY_PAGE_SIZE);
        self
    }

    /// Locate the failed state of `execution_arn` and the input it was entered with
    pub async fn locate_failure(&self, execution_arn: &str) -> Result<FailedStep, ResumeError> {
        info!(execution_arn, "Parsing failure history");

        let mut cursor =
            HistoryCursor::open(self.client.as_ref(), execution_arn, self.page_size).await?;

        let head = cursor.head().clone();
        let failure = head.execution_failed_event_details.as_ref().ok_or_else(|| {
            ResumeError::ExecutionNotFailed {
                execution_arn: execution_arn.to_string(),
                event_id: head.id,
            }
        })?;
        info!(
            execution_arn,
            error = failure.error.as_deref().unwrap_or(""),
            cause = failure.cause.as_deref().unwrap_or(""),
            "Execution failure details"
        );

        let failed_step = if failure.error.as_deref() == Some(RUNTIME_ERROR) {
            let cause = failure
                .cause
                .as_deref()
                .ok_or(CauseParseError::MissingCause)?;
            let event_id = parse_runtime_error_event_id(cause)?;
            debug!(event_id, "Runtime error points at event");

            let event = cursor.event(event_id).await?;
            entered_step(event).ok_or_else(|| {
                cursor.malformed(format!("event {} is not a state entry", event_id))
            })?
        } else {
            walk_back(&mut cursor, head.id).await?
        };

        info!(
            execution_arn,
            state = %failed_step.name,
            "Failed state identified"
        );
        Ok(failed_step)
    }
}

/// Follow back-links from `start_id` to the first task entered outside a
/// failed parallel region, or the parallel state that contains the failure.
async fn walk_back(
    cursor: &mut HistoryCursor<'_>,
    start_id: i64,
) -> Result<FailedStep, ResumeError> {
    let mut inside_failed_parallel = false;
    let mut current_id = start_id;

    while current_id != 0 {
        let event = cursor.event(current_id).await?;

        let is_answer = match event.event_type {
            HistoryEventType::ParallelStateFailed => {
                inside_failed_parallel = true;
                false
            }
            HistoryEventType::TaskStateEntered => !inside_failed_parallel,
            HistoryEventType::ParallelStateEntered => inside_failed_parallel,
            _ => false,
        };

        if is_answer {
            let event_id = event.id;
            return entered_step(event).ok_or_else(|| {
                cursor.malformed(format!("event {} has no state entry details", event_id))
            });
        }

        let previous_id = event.previous_event_id;
        if previous_id >= current_id {
            return Err(cursor.malformed(format!(
                "event {} links forward to {}",
                current_id, previous_id
            )));
        }
        current_id = previous_id;
    }

    Err(ResumeError::NoFailingStepFound(
        cursor.execution_arn.to_string(),
    ))
}

fn entered_step(event: &HistoryEvent) -> Option<FailedStep> {
    event
        .state_entered_event_details
        .as_ref()
        .map(|details| FailedStep {
            name: details.name.clone(),
            input: details.input.clone(),
        })
}
