//! Interaction Retrier
//!
//! Click, type and read elements. Every interaction resolves its element
//! through the [`Waiter`], performs the action through a [`FallbackChain`],
//! and retries the whole resolve-and-act sequence on transient errors
//! (stale handle, element vanished mid-action) up to the retry policy's
//! attempt ceiling. Anything else propagates at once.

use crate::actions::{KeySequence, Point, PointerSequence};
use crate::driver::{DriverResult, ElementHandle, RemoteDriver};
use crate::fallback::{FallbackChain, Mechanism};
use crate::gesture::{self, LongPressTarget, VENDOR_TYPE_TEXT};
use crate::locator::AbstractLocator;
use crate::result::{TaplineError, TaplineResult};
use crate::wait::{Readiness, Waiter};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Outcome of a successful interaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    /// Interaction name
    pub action: String,
    /// Locator (or target) that succeeded
    pub locator: String,
    /// Mechanism that performed the action
    pub mechanism: String,
    /// Attempts taken on the successful locator
    pub attempts: u32,
    /// Failures of locators tried before this one
    pub prior_failures: Vec<String>,
}

impl ActionReport {
    fn new(action: &str, locator: impl ToString, mechanism: &str, attempts: u32) -> Self {
        Self {
            action: action.to_string(),
            locator: locator.to_string(),
            mechanism: mechanism.to_string(),
            attempts,
            prior_failures: Vec::new(),
        }
    }
}

/// Attempt bookkeeping for one interaction
#[derive(Debug)]
pub struct RetryState {
    attempts: u32,
    ceiling: u32,
    last_error: Option<TaplineError>,
}

impl RetryState {
    /// Start with zero attempts
    #[must_use]
    pub const fn new(ceiling: u32) -> Self {
        Self {
            attempts: 0,
            ceiling,
            last_error: None,
        }
    }

    /// Count a new attempt and return its number (1-based)
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Remember a transient failure
    pub fn record(&mut self, err: TaplineError) {
        self.last_error = Some(err);
    }

    /// Whether another attempt is allowed
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        self.attempts < self.ceiling
    }

    /// Attempts so far
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Error reported once the ceiling is reached
    #[must_use]
    pub fn into_error(self, action: &str) -> TaplineError {
        TaplineError::TransientInteraction {
            action: action.to_string(),
            attempts: self.attempts,
            message: self
                .last_error
                .map_or_else(|| "no error recorded".to_string(), |err| err.to_string()),
        }
    }
}

// ============================================================================
// Mechanisms
// ============================================================================

struct NativeClick;

#[async_trait]
impl Mechanism<ElementHandle> for NativeClick {
    fn name(&self) -> &'static str {
        "native-click"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, target: &ElementHandle) -> DriverResult<()> {
        driver.element_click(target).await
    }
}

struct PointerTapElement;

#[async_trait]
impl Mechanism<ElementHandle> for PointerTapElement {
    fn name(&self) -> &'static str {
        "pointer-tap"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, target: &ElementHandle) -> DriverResult<()> {
        driver
            .perform_pointer_actions(&PointerSequence::tap_element(target))
            .await
    }
}

/// Element and text for the typing chain
#[derive(Debug, Clone)]
pub struct TypeTarget {
    /// Element to type into
    pub element: ElementHandle,
    /// Text to type
    pub text: String,
}

struct NativeClearAndType;

#[async_trait]
impl Mechanism<TypeTarget> for NativeClearAndType {
    fn name(&self) -> &'static str {
        "native-clear-and-type"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, target: &TypeTarget) -> DriverResult<()> {
        driver.element_clear(&target.element).await?;
        driver.element_send_keys(&target.element, &target.text).await
    }
}

struct TapAndKeyEvents;

#[async_trait]
impl Mechanism<TypeTarget> for TapAndKeyEvents {
    fn name(&self) -> &'static str {
        "tap-and-key-events"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, target: &TypeTarget) -> DriverResult<()> {
        driver
            .perform_pointer_actions(&PointerSequence::tap_element(&target.element))
            .await?;
        driver
            .perform_key_actions(&KeySequence::type_text(&target.text))
            .await
    }
}

struct VendorTypeText;

#[async_trait]
impl Mechanism<TypeTarget> for VendorTypeText {
    fn name(&self) -> &'static str {
        "vendor-type-text"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, target: &TypeTarget) -> DriverResult<()> {
        driver
            .execute_vendor_command(VENDOR_TYPE_TEXT, json!({ "text": target.text }))
            .await
            .map(|_| ())
    }
}

/// Native click, then a pointer tap centred on the element
#[must_use]
pub fn click_chain() -> FallbackChain<ElementHandle> {
    FallbackChain::new("click")
        .with(NativeClick)
        .with(PointerTapElement)
}

/// Native clear+type, tap-to-focus with key events, then vendor typeText
#[must_use]
pub fn send_keys_chain() -> FallbackChain<TypeTarget> {
    FallbackChain::new("send keys")
        .with(NativeClearAndType)
        .with(TapAndKeyEvents)
        .with(VendorTypeText)
}

// ============================================================================
// Interactor
// ============================================================================

/// Performs interactions with retry and fallback
#[derive(Debug, Clone)]
pub struct Interactor {
    waiter: Waiter,
}

impl Interactor {
    /// Create an interactor on top of a waiter
    #[must_use]
    pub const fn new(waiter: Waiter) -> Self {
        Self { waiter }
    }

    /// Underlying waiter
    #[must_use]
    pub const fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    /// Resolve as clickable and click
    pub async fn click(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<ActionReport> {
        self.act_with_retry(
            locator,
            &Readiness::Clickable,
            timeout,
            &click_chain(),
            |element| element,
        )
        .await
    }

    /// Resolve as visible, clear and type `text`
    pub async fn send_keys(
        &self,
        locator: &AbstractLocator,
        text: &str,
        timeout: Option<Duration>,
    ) -> TaplineResult<ActionReport> {
        self.act_with_retry(
            locator,
            &Readiness::Visible,
            timeout,
            &send_keys_chain(),
            |element| TypeTarget {
                element,
                text: text.to_string(),
            },
        )
        .await
    }

    /// Resolve as visible and read the text once
    pub async fn get_text(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<String> {
        let element = self.waiter.wait_for_visible(locator, timeout).await?;
        let text = self.waiter.driver().element_text(&element).await?;
        tracing::debug!(locator = %locator, chars = text.chars().count(), "Read element text");
        Ok(text)
    }

    /// Resolve as visible and press for `duration`
    pub async fn long_press(
        &self,
        locator: &AbstractLocator,
        duration: Duration,
        timeout: Option<Duration>,
    ) -> TaplineResult<ActionReport> {
        let duration_ms = duration.as_millis() as u64;
        self.act_with_retry(
            locator,
            &Readiness::Visible,
            timeout,
            &gesture::long_press_chain(),
            |element| LongPressTarget {
                element,
                duration_ms,
            },
        )
        .await
    }

    /// Tap at a viewport point
    pub async fn tap_at(&self, x: f64, y: f64) -> TaplineResult<ActionReport> {
        self.waiter.ensure_session()?;
        let point = Point::new(x, y);
        let mechanism = gesture::tap_chain().run(self.waiter.driver(), &point).await?;
        tracing::info!(x, y, mechanism, "Tapped point");
        Ok(ActionReport::new("tap", format!("point({x}, {y})"), mechanism, 1))
    }

    /// Dismiss the soft keyboard, returning the mechanism that worked
    pub async fn hide_keyboard(&self) -> TaplineResult<&'static str> {
        self.waiter.ensure_session()?;
        match gesture::hide_keyboard_chain().run(self.waiter.driver(), &()).await {
            Ok(mechanism) => {
                tracing::debug!(mechanism, "Keyboard hidden");
                Ok(mechanism)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Could not hide keyboard");
                Err(err)
            }
        }
    }

    /// Click the first locator that works
    pub async fn click_any(
        &self,
        locators: &[AbstractLocator],
        timeout: Option<Duration>,
    ) -> TaplineResult<ActionReport> {
        let mut tried = LocatorAttempts::new("click", locators)?;
        for locator in locators {
            match self.click(locator, timeout).await {
                Ok(report) => return Ok(tried.succeed(report)),
                Err(err) => tried.record(locator, err)?,
            }
        }
        Err(tried.exhausted())
    }

    /// Type into the first locator that works
    pub async fn send_keys_any(
        &self,
        locators: &[AbstractLocator],
        text: &str,
        timeout: Option<Duration>,
    ) -> TaplineResult<ActionReport> {
        let mut tried = LocatorAttempts::new("send keys", locators)?;
        for locator in locators {
            match self.send_keys(locator, text, timeout).await {
                Ok(report) => return Ok(tried.succeed(report)),
                Err(err) => tried.record(locator, err)?,
            }
        }
        Err(tried.exhausted())
    }

    /// Read the text of the first locator that works
    pub async fn get_text_any(
        &self,
        locators: &[AbstractLocator],
        timeout: Option<Duration>,
    ) -> TaplineResult<String> {
        let mut tried = LocatorAttempts::new("get text", locators)?;
        for locator in locators {
            match self.get_text(locator, timeout).await {
                Ok(text) => {
                    tried.log_success(locator);
                    return Ok(text);
                }
                Err(err) => tried.record(locator, err)?,
            }
        }
        Err(tried.exhausted())
    }

    async fn act_with_retry<T, F>(
        &self,
        locator: &AbstractLocator,
        readiness: &Readiness,
        timeout: Option<Duration>,
        chain: &FallbackChain<T>,
        make_target: F,
    ) -> TaplineResult<ActionReport>
    where
        T: Sync,
        F: Fn(ElementHandle) -> T,
    {
        let action = chain.action();
        let policy = self.waiter.config().retry;
        let mut state = RetryState::new(policy.max_attempts);
        loop {
            let attempt = state.begin_attempt();
            let outcome = match self.waiter.wait_until(locator, readiness, timeout).await {
                Ok(element) => chain.run(self.waiter.driver(), &make_target(element)).await,
                Err(err) => Err(err),
            };
            match outcome {
                Ok(mechanism) => {
                    tracing::info!(
                        action,
                        locator = %locator,
                        mechanism,
                        attempt,
                        "Interaction succeeded"
                    );
                    return Ok(ActionReport::new(action, locator, mechanism, attempt));
                }
                Err(err) if err.is_transient() => {
                    tracing::warn!(
                        action,
                        locator = %locator,
                        attempt,
                        max_attempts = policy.max_attempts,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    state.record(err);
                    if !state.can_retry() {
                        return Err(state.into_error(action));
                    }
                    self.waiter.clock().sleep(policy.pause()).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Failures collected while walking alternative locators
struct LocatorAttempts {
    action: &'static str,
    failures: Vec<String>,
    last: Option<TaplineError>,
}

impl LocatorAttempts {
    fn new(action: &'static str, locators: &[AbstractLocator]) -> TaplineResult<Self> {
        if locators.is_empty() {
            return Err(TaplineError::unsupported_locator(format!(
                "no locators supplied to {action}"
            )));
        }
        Ok(Self {
            action,
            failures: Vec::new(),
            last: None,
        })
    }

    fn record(&mut self, locator: &AbstractLocator, err: TaplineError) -> TaplineResult<()> {
        if matches!(err, TaplineError::SessionNotActive { .. }) {
            return Err(err);
        }
        tracing::warn!(
            action = self.action,
            locator = %locator,
            error = %err,
            "Locator failed, trying next"
        );
        self.failures.push(format!("{locator}: {err}"));
        self.last = Some(err);
        Ok(())
    }

    fn log_success(&self, locator: &AbstractLocator) {
        if !self.failures.is_empty() {
            tracing::info!(
                action = self.action,
                locator = %locator,
                prior_failures = self.failures.len(),
                "Alternative locator succeeded"
            );
        }
    }

    fn succeed(self, mut report: ActionReport) -> ActionReport {
        report.prior_failures = self.failures;
        report
    }

    fn exhausted(self) -> TaplineError {
        match self.last {
            Some(last) => TaplineError::AllLocatorsFailed {
                action: self.action.to_string(),
                tried: self.failures.len(),
                last: Box::new(last),
            },
            None => TaplineError::unsupported_locator(format!(
                "no locators supplied to {}",
                self.action
            )),
        }
    }
}
