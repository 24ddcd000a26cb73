//! Reading the originating event id out of a `States.Runtime` cause.
//!
//! The service reports runtime errors with a sentence such as
//!
//! ```text
//! An error occurred while executing the state 'Load' (entered at the event id #7). The JSONPath ...
//! ```
//!
//! and the event id is the 14th whitespace-delimited token. This couples us to
//! the service's wording, so any drift surfaces as a [`CauseParseError`].

use super::error::CauseParseError;

/// Error name the service uses for runtime failures
pub const RUNTIME_ERROR: &str = "States.Runtime";

/// Zero-based position of the event id token in the cause message
pub const EVENT_ID_TOKEN: usize = 13;

/// Extract the id of the event whose state raised the runtime error
pub fn parse_runtime_error_event_id(cause: &str) -> Result<i64, CauseParseError> {
    let token = cause
        .split_whitespace()
        .nth(EVENT_ID_TOKEN)
        .ok_or_else(|| CauseParseError::MissingToken {
            position: EVENT_ID_TOKEN,
            cause: cause.to_string(),
        })?;

    let digits: String = token.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse()
        .map_err(|_| CauseParseError::NoEventId(token.to_string()))
}
