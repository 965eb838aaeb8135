//! Engine configuration.
//!
//! [`EngineConfig`] is built by the caller (YAML file, environment, builder)
//! and handed to the engine by value. Nothing inside the engine reads the
//! environment.

use crate::platform::Platform;
use crate::result::{TaplineError, TaplineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default wait timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Default poll interval
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
/// Default timeout of the `is_displayed` presence probe
pub const DEFAULT_PRESENCE_CHECK_TIMEOUT_MS: u64 = 2_000;
/// Default interaction attempt ceiling
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default pause between interaction attempts
pub const DEFAULT_RETRY_PAUSE_MS: u64 = 300;
/// Default swipe distance as a fraction of the screen
pub const DEFAULT_SWIPE_DISTANCE: f64 = 0.5;
/// Default swipe gesture duration
pub const DEFAULT_SWIPE_DURATION_MS: u64 = 300;
/// Default settle time after a swipe
pub const DEFAULT_SWIPE_SETTLE_MS: u64 = 500;

/// Platform override
pub const ENV_PLATFORM: &str = "PLATFORM";
/// Default timeout override
pub const ENV_TIMEOUT_MS: &str = "TAPLINE_TIMEOUT_MS";
/// Poll interval override
pub const ENV_POLL_INTERVAL_MS: &str = "TAPLINE_POLL_INTERVAL_MS";

/// Transient-error retry policy for interactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempt ceiling, including the first attempt
    pub max_attempts: u32,
    /// Pause between attempts
    pub pause_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            pause_ms: DEFAULT_RETRY_PAUSE_MS,
        }
    }
}

impl RetryPolicy {
    /// Create a retry policy
    #[must_use]
    pub const fn new(max_attempts: u32, pause_ms: u64) -> Self {
        Self {
            max_attempts,
            pause_ms,
        }
    }

    /// Pause as a duration
    #[must_use]
    pub const fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

/// Swipe tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    /// Travel as a fraction of the screen dimension
    pub distance: f64,
    /// Gesture duration
    pub duration_ms: u64,
    /// Wait after each swipe for the UI to settle
    pub settle_ms: u64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            distance: DEFAULT_SWIPE_DISTANCE,
            duration_ms: DEFAULT_SWIPE_DURATION_MS,
            settle_ms: DEFAULT_SWIPE_SETTLE_MS,
        }
    }
}

impl SwipeConfig {
    /// Settle time as a duration
    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Timeout used when a call passes none
    pub default_timeout_ms: u64,
    /// Sleep between polling rounds
    pub poll_interval_ms: u64,
    /// Timeout of the `is_displayed` presence probe
    pub presence_check_timeout_ms: u64,
    /// Interaction retry policy
    pub retry: RetryPolicy,
    /// Swipe tuning
    pub swipe: SwipeConfig,
    /// Target platform
    pub platform: Platform,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            presence_check_timeout_ms: DEFAULT_PRESENCE_CHECK_TIMEOUT_MS,
            retry: RetryPolicy::default(),
            swipe: SwipeConfig::default(),
            platform: Platform::default(),
        }
    }
}

impl EngineConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default timeout
    #[must_use]
    pub const fn with_default_timeout(mut self, ms: u64) -> Self {
        self.default_timeout_ms = ms;
        self
    }

    /// Set the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the presence probe timeout
    #[must_use]
    pub const fn with_presence_check_timeout(mut self, ms: u64) -> Self {
        self.presence_check_timeout_ms = ms;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the swipe tuning
    #[must_use]
    pub const fn with_swipe(mut self, swipe: SwipeConfig) -> Self {
        self.swipe = swipe;
        self
    }

    /// Set the platform
    #[must_use]
    pub const fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Default timeout as a duration
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Poll interval as a duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Presence probe timeout as a duration
    #[must_use]
    pub const fn presence_check_timeout(&self) -> Duration {
        Duration::from_millis(self.presence_check_timeout_ms)
    }

    /// Check invariants
    pub fn validate(&self) -> TaplineResult<()> {
        if self.default_timeout_ms == 0 {
            return Err(TaplineError::config("default_timeout_ms must be greater than 0"));
        }
        if self.poll_interval_ms == 0 {
            return Err(TaplineError::config("poll_interval_ms must be greater than 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(TaplineError::config("retry.max_attempts must be at least 1"));
        }
        if !(self.swipe.distance > 0.0 && self.swipe.distance <= 0.8) {
            return Err(TaplineError::config(format!(
                "swipe.distance must be in (0, 0.8], got {}",
                self.swipe.distance
            )));
        }
        Ok(())
    }

    /// Parse and validate YAML
    pub fn from_yaml_str(yaml: &str) -> TaplineResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> TaplineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> TaplineResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply `PLATFORM`, `TAPLINE_TIMEOUT_MS` and `TAPLINE_POLL_INTERVAL_MS`
    /// through `lookup`.
    pub fn apply_env_with<F>(mut self, lookup: F) -> TaplineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PLATFORM) {
            self.platform = Platform::detect(Some(&value), None);
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.default_timeout_ms = parse_ms(ENV_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_ms(ENV_POLL_INTERVAL_MS, &value)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> TaplineResult<Self> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }
}

fn parse_ms(key: &str, value: &str) -> TaplineResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            TaplineError::config(format!(
                "{key} must be a number of milliseconds, got {value:?}"
            ))
        })
}
