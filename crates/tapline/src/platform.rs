//! Target platform detection.

use crate::result::{TaplineError, TaplineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mobile platform under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Android (UiAutomator2)
    #[default]
    Android,
    /// iOS (XCUITest)
    Ios,
}

impl Platform {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Android => "android",
            Self::Ios => "ios",
        }
    }

    /// Case-insensitive parse
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "android" => Some(Self::Android),
            "ios" => Some(Self::Ios),
            _ => None,
        }
    }

    /// Pick the platform from an env value, then a session capability,
    /// defaulting to Android.
    #[must_use]
    pub fn detect(env_value: Option<&str>, capability: Option<&str>) -> Self {
        if let Some(platform) = env_value.and_then(Self::parse) {
            return platform;
        }
        if let Some(platform) = capability.and_then(Self::parse) {
            return platform;
        }
        if env_value.is_some() || capability.is_some() {
            tracing::warn!(
                env = env_value,
                capability,
                "Unrecognised platform name, defaulting to android"
            );
        }
        Self::Android
    }
}

impl FromStr for Platform {
    type Err = TaplineError;

    fn from_str(s: &str) -> TaplineResult<Self> {
        Self::parse(s).ok_or_else(|| {
            TaplineError::invalid_argument(format!(
                "Invalid platform: {s}. Expected android or ios"
            ))
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
