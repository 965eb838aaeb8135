//! RemoteDriver - Abstract Mobile Automation Endpoint
//!
//! The engine talks to an Appium-style W3C WebDriver session through the
//! [`RemoteDriver`] trait. Session establishment, capability building and
//! the wire protocol live behind it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  RemoteDriver (Abstract Trait)                                      │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐  ┌─────────────────────┐  ┌─────────────┐  │
//! │  │  HTTP adapter       │  │  In-process bridge  │  │  MockDriver │  │
//! │  │  (downstream crate) │  │  (downstream crate) │  │  (tests)    │  │
//! │  └─────────────────────┘  └─────────────────────┘  └─────────────┘  │
//! │                                                                     │
//! │  Error codes are classified here, once, into DriverErrorKind        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use crate::actions::{KeySequence, PointerSequence};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// W3C element reference key
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Opaque reference to a UI element in the remote session.
///
/// Handles can be revoked by the app at any time; the engine never caches
/// them across polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    id: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Driver-assigned element id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// W3C element reference object (`{"element-6066-...": id}`)
    #[must_use]
    pub fn to_reference(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert(ELEMENT_KEY.to_string(), serde_json::Value::from(self.id.as_str()));
        serde_json::Value::Object(map)
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element({})", self.id)
    }
}

/// Device viewport size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl WindowSize {
    /// Create a new window size
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

// ============================================================================
// Driver errors
// ============================================================================

/// Classified driver failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverErrorKind {
    /// Handle was revoked by a re-render
    StaleElement,
    /// Lookup matched nothing (or the element vanished mid-action)
    NoSuchElement,
    /// Strategy or selector rejected by the endpoint
    InvalidSelector,
    /// Command not implemented by the endpoint or platform
    Unsupported,
    /// Element exists but cannot take the input
    NotInteractable,
    /// Session is gone
    InvalidSession,
    /// Endpoint-side timeout
    Timeout,
    /// Anything else
    Other,
}

impl DriverErrorKind {
    /// Map a W3C WebDriver error code to a kind
    #[must_use]
    pub fn from_protocol_code(code: &str) -> Self {
        match code {
            "stale element reference" => Self::StaleElement,
            "no such element" => Self::NoSuchElement,
            "invalid selector" | "invalid argument" => Self::InvalidSelector,
            "unknown command" | "unknown method" | "unsupported operation" => Self::Unsupported,
            "element not interactable" | "element click intercepted" => Self::NotInteractable,
            "invalid session id" | "session not created" => Self::InvalidSession,
            "timeout" | "script timeout" => Self::Timeout,
            _ => Self::Other,
        }
    }

    /// Classify legacy error text when no protocol code is available
    #[must_use]
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if lower.contains("stale") {
            Self::StaleElement
        } else if lower.contains("no such element") {
            Self::NoSuchElement
        } else if lower.contains("invalid session")
            || lower.contains("session is either terminated")
        {
            Self::InvalidSession
        } else if lower.contains("not implemented")
            || lower.contains("unknown command")
            || lower.contains("not supported")
        {
            Self::Unsupported
        } else if lower.contains("invalid selector") {
            Self::InvalidSelector
        } else if lower.contains("not interactable") {
            Self::NotInteractable
        } else {
            Self::Other
        }
    }

    /// Transient kinds are retried by the interaction retrier
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::StaleElement | Self::NoSuchElement)
    }

    /// Short name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StaleElement => "stale element",
            Self::NoSuchElement => "no such element",
            Self::InvalidSelector => "invalid selector",
            Self::Unsupported => "unsupported",
            Self::NotInteractable => "not interactable",
            Self::InvalidSession => "invalid session",
            Self::Timeout => "timeout",
            Self::Other => "driver error",
        }
    }
}

impl fmt::Display for DriverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a [`RemoteDriver`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct DriverError {
    /// Classified kind
    pub kind: DriverErrorKind,
    /// Endpoint message
    pub message: String,
}

impl DriverError {
    /// Create a new driver error
    #[must_use]
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Stale element reference
    #[must_use]
    pub fn stale(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::StaleElement, message)
    }

    /// No such element
    #[must_use]
    pub fn no_such_element(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::NoSuchElement, message)
    }

    /// Unsupported command
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Unsupported, message)
    }

    /// Session gone
    #[must_use]
    pub fn invalid_session(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::InvalidSession, message)
    }

    /// Unclassified failure
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Other, message)
    }

    /// Build an error from legacy message text
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(DriverErrorKind::classify_message(&message), message)
    }

    /// Parse a W3C error response body (`{"value": {"error": .., "message": ..}}`).
    ///
    /// Returns `None` when the body carries no error code.
    #[must_use]
    pub fn from_response(body: &serde_json::Value) -> Option<Self> {
        let value = body.get("value")?;
        let code = value.get("error")?.as_str()?;
        let message = value
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(code);
        Some(Self::new(DriverErrorKind::from_protocol_code(code), message))
    }

    /// Whether this error is transient
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Result type for driver calls
pub type DriverResult<T> = Result<T, DriverError>;

// ============================================================================
// RemoteDriver trait
// ============================================================================

/// Abstract remote automation endpoint
#[async_trait]
pub trait RemoteDriver: Send + Sync {
    /// Find one element by strategy and selector
    async fn find_element(&self, strategy: &str, selector: &str) -> DriverResult<ElementHandle>;

    /// Whether the element is displayed
    async fn is_element_displayed(&self, element: &ElementHandle) -> DriverResult<bool>;

    /// Visible text of the element
    async fn element_text(&self, element: &ElementHandle) -> DriverResult<String>;

    /// Native element click
    async fn element_click(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Clear an editable element
    async fn element_clear(&self, element: &ElementHandle) -> DriverResult<()>;

    /// Native send keys
    async fn element_send_keys(&self, element: &ElementHandle, text: &str) -> DriverResult<()>;

    /// Viewport size
    async fn window_size(&self) -> DriverResult<WindowSize>;

    /// Perform a W3C pointer action sequence
    async fn perform_pointer_actions(&self, sequence: &PointerSequence) -> DriverResult<()>;

    /// Perform a W3C key action sequence
    async fn perform_key_actions(&self, sequence: &KeySequence) -> DriverResult<()>;

    /// Execute a vendor command such as `"mobile: swipe"`
    async fn execute_vendor_command(
        &self,
        name: &str,
        params: serde_json::Value,
    ) -> DriverResult<serde_json::Value>;

    /// Dedicated hide-keyboard primitive
    async fn hide_keyboard(&self) -> DriverResult<()> {
        Err(DriverError::unsupported("hide keyboard is not available on this driver"))
    }

    /// Press a platform key code (Android)
    async fn press_key_code(&self, code: u32) -> DriverResult<()> {
        Err(DriverError::unsupported(format!(
            "press key code {code} is not available on this driver"
        )))
    }

    /// Whether the session is live
    fn is_session_active(&self) -> bool {
        true
    }
}
