//! Harness error types
//!
//! One error enum for everything a test can observe: guard failures,
//! failed lookups and assertions, malformed traffic from the application
//! under test, and transport-level failures.

use std::fmt;

use crate::types::ElementKind;

/// Which screen context a text lookup ran against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    View,
    Channel,
}

impl fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenKind::View => write!(f, "view"),
            ScreenKind::Channel => write!(f, "channel"),
        }
    }
}

/// Which session log a polling assertion watched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Request,
    Message,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogKind::Request => write!(f, "Request"),
            LogKind::Message => write!(f, "Message"),
        }
    }
}

/// Errors surfaced by the Slack test harness
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Start the mock Slack server first by awaiting `init()`")]
    NotInitialized,

    #[error("Provide an actor team ID and user ID, in the harness configuration or via `act_as`")]
    NoActor,

    #[error("No active screen; open a home view or a channel first")]
    NoActiveScreen,

    #[error("Unable to find {element} with the label '{label}'")]
    ElementNotFound { element: ElementKind, label: String },

    #[error("Unable to interact with the matching {element} element: it has no associated action ID")]
    MissingActionId { element: ElementKind },

    #[error("The active screen is a channel; interacting with channels is unsupported")]
    UnsupportedOperation,

    #[error("Unable to find the text {text:?} in the current {context}")]
    TextNotFound { text: String, context: ScreenKind },

    #[error("Did not find any matching view publishes")]
    NoMatchingRequests,

    #[error("Did not find {expected} matching view publishes (got {found})")]
    CountMismatch { expected: usize, found: usize },

    #[error("{log} log never populated")]
    LogNeverPopulated { log: LogKind },

    #[error("Invalid request for `{endpoint}`: {reason}")]
    MalformedRequest { endpoint: String, reason: String },

    #[error("Harness configuration is missing `{option}`, required for this call")]
    MissingConfiguration { option: &'static str },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to bind the mock Slack server: {0}")]
    Bind(#[source] std::io::Error),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}
