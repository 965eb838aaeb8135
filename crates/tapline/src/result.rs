//! Result and error types for Tapline.

use crate::driver::{DriverError, DriverErrorKind};
use crate::fallback::MechanismFailure;
use crate::locator::{describe_candidates, StrategyCandidate};
use thiserror::Error;

/// Result type for Tapline operations
pub type TaplineResult<T> = Result<T, TaplineError>;

/// Errors that can occur in Tapline
#[derive(Debug, Error)]
pub enum TaplineError {
    /// No candidate satisfied the readiness predicate before the deadline
    #[error(
        "Element not found within {elapsed_ms}ms for {locator}. Tried strategies: {}. Last error: {}",
        describe_candidates(.strategies),
        .last_error.as_deref().unwrap_or("unknown")
    )]
    NotFound {
        /// Locator description
        locator: String,
        /// Candidates tried every round, in order
        strategies: Vec<StrategyCandidate>,
        /// Time spent polling
        elapsed_ms: u64,
        /// Last swallowed lookup or readiness failure
        last_error: Option<String>,
    },

    /// Scroll search ran out of swipes
    #[error("Element not found after {max_swipes} swipes: {locator}")]
    SwipeBudgetExhausted {
        /// Locator description
        locator: String,
        /// Swipe budget that was exhausted
        max_swipes: u32,
    },

    /// Element was still present when the disappearance wait ended
    #[error(
        "Element still present after {elapsed_ms}ms: {locator}. Strategies: {}",
        describe_candidates(.strategies)
    )]
    StillPresent {
        /// Locator description
        locator: String,
        /// Candidates checked every round
        strategies: Vec<StrategyCandidate>,
        /// Time spent polling
        elapsed_ms: u64,
    },

    /// Staleness or a vanished element kept interrupting an interaction
    #[error("{action} failed after {attempts} attempts on transient errors: {message}")]
    TransientInteraction {
        /// Interaction name
        action: String,
        /// Attempts made, including the first
        attempts: u32,
        /// Last transient error
        message: String,
    },

    /// Malformed or empty locator
    #[error("Unsupported locator: {message}")]
    UnsupportedLocator {
        /// Error message
        message: String,
    },

    /// Interaction attempted without a live driver session
    #[error("Session not active: {message}")]
    SessionNotActive {
        /// Error message
        message: String,
    },

    /// Every mechanism of a fallback chain failed
    #[error("Failed to {action}: every mechanism failed ({})", describe_chain(.chain))]
    FallbackExhausted {
        /// Interaction name
        action: String,
        /// Failure of each mechanism, in the order attempted
        chain: Vec<MechanismFailure>,
    },

    /// Every alternative locator failed
    #[error("Failed to {action} with all {tried} locator strategies: {last}")]
    AllLocatorsFailed {
        /// Interaction name
        action: String,
        /// Number of locators tried
        tried: usize,
        /// Failure of the last locator
        last: Box<TaplineError>,
    },

    /// Driver failure outside the transient/session classes
    #[error("Driver error: {0}")]
    Driver(DriverError),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl TaplineError {
    /// Create an unsupported locator error
    #[must_use]
    pub fn unsupported_locator(message: impl Into<String>) -> Self {
        Self::UnsupportedLocator {
            message: message.into(),
        }
    }

    /// Create a session not active error
    #[must_use]
    pub fn session_not_active(message: impl Into<String>) -> Self {
        Self::SessionNotActive {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the interaction retrier may retry after this error
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Driver(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Whether this error means the element could not be resolved
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::SwipeBudgetExhausted { .. })
    }

    /// Fatal errors are never retried and never recovered locally
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedLocator { .. } | Self::SessionNotActive { .. }
        )
    }
}

impl From<DriverError> for TaplineError {
    fn from(err: DriverError) -> Self {
        match err.kind {
            DriverErrorKind::InvalidSession => Self::SessionNotActive {
                message: err.message,
            },
            _ => Self::Driver(err),
        }
    }
}

fn describe_chain(chain: &[MechanismFailure]) -> String {
    if chain.is_empty() {
        return "no mechanisms configured".to_string();
    }
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
