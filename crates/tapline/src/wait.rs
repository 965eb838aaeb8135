//! Polling Waiter
//!
//! Timeout-bounded polling of the remote driver until a readiness predicate
//! holds for one of a locator's candidates.
//!
//! ## Polling rules
//!
//! - The budget is computed once at entry and never reset.
//! - Candidates are tried in resolver order on every round; the first ready
//!   one wins.
//! - Per-candidate lookup failures are swallowed and remembered for the
//!   timeout error. Session loss aborts at once.
//! - The deadline is checked at the top of each round; an in-flight lookup
//!   is allowed to finish.

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::driver::{DriverError, DriverErrorKind, DriverResult, ElementHandle, RemoteDriver};
use crate::locator::{AbstractLocator, StrategyCandidate};
use crate::result::{TaplineError, TaplineResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// READINESS
// =============================================================================

/// Condition an element must meet to end a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Lookup succeeds
    Present,
    /// Lookup succeeds and the element is displayed
    Visible,
    /// Same as `Present`; no enablement probe
    Clickable,
    /// Element text contains the substring (case-sensitive)
    TextContains(String),
}

impl Readiness {
    /// Evaluate against a freshly resolved element
    pub async fn is_satisfied(
        &self,
        driver: &dyn RemoteDriver,
        element: &ElementHandle,
    ) -> DriverResult<bool> {
        match self {
            Self::Present | Self::Clickable => Ok(true),
            Self::Visible => driver.is_element_displayed(element).await,
            Self::TextContains(expected) => {
                let text = driver.element_text(element).await?;
                Ok(text.contains(expected.as_str()))
            }
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Visible => f.write_str("visible"),
            Self::Clickable => f.write_str("clickable"),
            Self::TextContains(text) => write!(f, "containing text \"{text}\""),
        }
    }
}

// =============================================================================
// TIMEOUT BUDGET
// =============================================================================

/// Deadline of one wait, fixed at entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget {
    started_ms: u64,
    deadline_ms: u64,
}

impl TimeoutBudget {
    /// Start a budget at `now_ms`
    #[must_use]
    pub fn start(now_ms: u64, timeout: Duration) -> Self {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        Self {
            started_ms: now_ms,
            deadline_ms: now_ms.saturating_add(timeout_ms),
        }
    }

    /// Whether the deadline passed
    #[must_use]
    pub const fn expired(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms
    }

    /// Time since start
    #[must_use]
    pub const fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.started_ms)
    }

    /// Time left before the deadline
    #[must_use]
    pub const fn remaining(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.deadline_ms.saturating_sub(now_ms))
    }

    /// Total budget
    #[must_use]
    pub const fn total_ms(&self) -> u64 {
        self.deadline_ms - self.started_ms
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Polls a driver for elements
#[derive(Clone)]
pub struct Waiter {
    driver: Arc<dyn RemoteDriver>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl fmt::Debug for Waiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waiter")
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Waiter {
    /// Create a waiter
    #[must_use]
    pub fn new(driver: Arc<dyn RemoteDriver>, clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        Self {
            driver,
            clock,
            config,
        }
    }

    /// Engine configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Session driver
    #[must_use]
    pub fn driver(&self) -> &dyn RemoteDriver {
        self.driver.as_ref()
    }

    /// Injected clock
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Fail with `SessionNotActive` when the session is gone
    pub fn ensure_session(&self) -> TaplineResult<()> {
        if self.driver.is_session_active() {
            Ok(())
        } else {
            Err(TaplineError::session_not_active("no active driver session"))
        }
    }

    /// Poll until one candidate of `locator` satisfies `readiness`
    pub async fn wait_until(
        &self,
        locator: &AbstractLocator,
        readiness: &Readiness,
        timeout: Option<Duration>,
    ) -> TaplineResult<ElementHandle> {
        self.ensure_session()?;
        locator.validate()?;
        let budget = self.budget(timeout);
        let candidates = locator.resolve();
        let mut last_error = None;
        let mut round = 0_u32;

        while !budget.expired(self.clock.now_ms()) {
            round += 1;
            if let Some(handle) = self.probe_round(&candidates, readiness, &mut last_error).await? {
                tracing::debug!(
                    locator = %locator,
                    readiness = %readiness,
                    round,
                    elapsed_ms = budget.elapsed_ms(self.clock.now_ms()),
                    "Element ready"
                );
                return Ok(handle);
            }
            tracing::debug!(locator = %locator, round, "No candidate ready, polling again");
            self.clock.sleep(self.config.poll_interval()).await;
        }

        let elapsed_ms = budget.elapsed_ms(self.clock.now_ms());
        tracing::warn!(
            locator = %locator,
            readiness = %readiness,
            elapsed_ms,
            rounds = round,
            "Timed out waiting for element"
        );
        Err(TaplineError::NotFound {
            locator: locator.to_string(),
            strategies: candidates,
            elapsed_ms,
            last_error,
        })
    }

    /// Wait for presence
    pub async fn wait_for_present(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<ElementHandle> {
        self.wait_until(locator, &Readiness::Present, timeout).await
    }

    /// Wait for visibility
    pub async fn wait_for_visible(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<ElementHandle> {
        self.wait_until(locator, &Readiness::Visible, timeout).await
    }

    /// Wait for clickability (presence)
    pub async fn wait_for_clickable(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<ElementHandle> {
        self.wait_until(locator, &Readiness::Clickable, timeout).await
    }

    /// Wait until the element text contains `text`
    pub async fn wait_for_text(
        &self,
        locator: &AbstractLocator,
        text: &str,
        timeout: Option<Duration>,
    ) -> TaplineResult<ElementHandle> {
        self.wait_until(locator, &Readiness::TextContains(text.to_string()), timeout)
            .await
    }

    /// Poll until no candidate of `locator` resolves
    pub async fn wait_until_absent(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<()> {
        self.ensure_session()?;
        locator.validate()?;
        let budget = self.budget(timeout);
        let candidates = locator.resolve();

        while !budget.expired(self.clock.now_ms()) {
            if !self.any_resolves(&candidates).await? {
                tracing::debug!(locator = %locator, "Element absent");
                return Ok(());
            }
            self.clock.sleep(self.config.poll_interval()).await;
        }

        let elapsed_ms = budget.elapsed_ms(self.clock.now_ms());
        tracing::warn!(locator = %locator, elapsed_ms, "Element still present");
        Err(TaplineError::StillPresent {
            locator: locator.to_string(),
            strategies: candidates,
            elapsed_ms,
        })
    }

    /// One non-polling round
    pub async fn find_immediate(
        &self,
        locator: &AbstractLocator,
        readiness: &Readiness,
    ) -> TaplineResult<Option<ElementHandle>> {
        self.ensure_session()?;
        locator.validate()?;
        let mut last_error = None;
        self.probe_round(&locator.resolve(), readiness, &mut last_error)
            .await
    }

    /// Whether the element shows up within `timeout` (default: the presence
    /// probe timeout) and is displayed. Never fails.
    pub async fn is_displayed(&self, locator: &AbstractLocator, timeout: Option<Duration>) -> bool {
        let timeout = non_zero(timeout).unwrap_or_else(|| self.config.presence_check_timeout());
        let handle = match self.wait_for_present(locator, Some(timeout)).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::debug!(locator = %locator, error = %err, "Element not displayed");
                return false;
            }
        };
        match self.driver.is_element_displayed(&handle).await {
            Ok(displayed) => displayed,
            Err(err) => {
                tracing::debug!(locator = %locator, error = %err, "Displayed check failed");
                false
            }
        }
    }

    fn budget(&self, timeout: Option<Duration>) -> TimeoutBudget {
        TimeoutBudget::start(
            self.clock.now_ms(),
            non_zero(timeout).unwrap_or_else(|| self.config.default_timeout()),
        )
    }

    async fn probe_round(
        &self,
        candidates: &[StrategyCandidate],
        readiness: &Readiness,
        last_error: &mut Option<String>,
    ) -> TaplineResult<Option<ElementHandle>> {
        for candidate in candidates {
            let handle = match self
                .driver
                .find_element(&candidate.strategy, &candidate.selector)
                .await
            {
                Ok(handle) => handle,
                Err(err) => {
                    abort_on_session_loss(&err)?;
                    tracing::debug!(candidate = %candidate, error = %err, "Lookup failed");
                    *last_error = Some(err.to_string());
                    continue;
                }
            };
            match readiness.is_satisfied(self.driver.as_ref(), &handle).await {
                Ok(true) => return Ok(Some(handle)),
                Ok(false) => {
                    *last_error = Some(format!("{candidate} resolved but is not {readiness}"));
                }
                Err(err) => {
                    abort_on_session_loss(&err)?;
                    *last_error = Some(err.to_string());
                }
            }
        }
        Ok(None)
    }

    async fn any_resolves(&self, candidates: &[StrategyCandidate]) -> TaplineResult<bool> {
        for candidate in candidates {
            match self
                .driver
                .find_element(&candidate.strategy, &candidate.selector)
                .await
            {
                Ok(_) => return Ok(true),
                Err(err) => abort_on_session_loss(&err)?,
            }
        }
        Ok(false)
    }
}

/// A zero override falls back to the configured default
fn non_zero(timeout: Option<Duration>) -> Option<Duration> {
    timeout.filter(|t| !t.is_zero())
}

fn abort_on_session_loss(err: &DriverError) -> TaplineResult<()> {
    if err.kind == DriverErrorKind::InvalidSession {
        return Err(TaplineError::session_not_active(err.message.clone()));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::mock::{MockCall, MockDriver, MockElement};

    fn fixture(
        driver: MockDriver,
        config: EngineConfig,
    ) -> (Waiter, Arc<MockDriver>, Arc<FakeClock>) {
        let driver = Arc::new(driver);
        let clock = Arc::new(FakeClock::new());
        let waiter = Waiter::new(driver.clone(), clock.clone(), config);
        (waiter, driver, clock)
    }

    fn ms(value: u64) -> Option<Duration> {
        Some(Duration::from_millis(value))
    }

    // =========================================================================
    // TIMEOUT BUDGET
    // =========================================================================

    mod budget_tests {
        use super::*;

        #[test]
        fn test_budget_arithmetic() {
            let budget = TimeoutBudget::start(1_000, Duration::from_millis(500));
            assert!(!budget.expired(1_499));
            assert!(budget.expired(1_500));
            assert_eq!(budget.elapsed_ms(1_200), 200);
            assert_eq!(budget.remaining(1_200), Duration::from_millis(300));
            assert_eq!(budget.remaining(9_999), Duration::ZERO);
            assert_eq!(budget.total_ms(), 500);
        }

        #[test]
        fn test_zero_budget_is_expired_at_start() {
            let budget = TimeoutBudget::start(10, Duration::ZERO);
            assert!(budget.expired(10));
        }
    }

    // =========================================================================
    // WAIT UNTIL
    // =========================================================================

    mod waiter_tests {
        use super::*;

        #[tokio::test]
        async fn test_ready_element_returns_in_first_round() {
            let (waiter, _, clock) = fixture(
                MockDriver::new().with_element("id", "login", MockElement::new("e1")),
                EngineConfig::default(),
            );
            let handle = waiter
                .wait_for_present(&AbstractLocator::by_id("login"), ms(2_000))
                .await
                .unwrap();
            assert_eq!(handle.id(), "e1");
            assert_eq!(clock.sleep_count(), 0);
        }

        #[tokio::test]
        async fn test_never_ready_times_out_within_one_interval() {
            let (waiter, _, clock) = fixture(MockDriver::new(), EngineConfig::default());
            let err = waiter
                .wait_for_visible(&AbstractLocator::by_id("missing"), ms(2_000))
                .await
                .unwrap_err();
            match err {
                TaplineError::NotFound {
                    elapsed_ms,
                    strategies,
                    last_error,
                    ..
                } => {
                    assert!((2_000..=2_500).contains(&elapsed_ms), "elapsed {elapsed_ms}");
                    assert_eq!(strategies.len(), 2);
                    assert!(last_error.unwrap().contains("no such element"));
                }
                other => panic!("unexpected error: {other}"),
            }
            assert!(clock.now_ms() >= 2_000);
        }

        #[tokio::test]
        async fn test_default_timeout_from_config() {
            let config = EngineConfig::default()
                .with_default_timeout(1_200)
                .with_poll_interval(400);
            let (waiter, _, clock) = fixture(MockDriver::new(), config);
            let err = waiter
                .wait_for_present(&AbstractLocator::by_xpath("//nothing"), None)
                .await
                .unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(clock.now_ms(), 1_200);
            assert_eq!(clock.sleep_count(), 3);
        }

        #[tokio::test]
        async fn test_candidates_tried_in_order_each_round() {
            let driver = MockDriver::new().with_element(
                "xpath",
                "//*[@resource-id='late']",
                MockElement::new("e1").appearing_after(1),
            );
            driver.reject_strategy("id");
            let (waiter, driver, clock) = fixture(driver, EngineConfig::default());
            let handle = waiter
                .wait_for_present(&AbstractLocator::by_id("late"), ms(5_000))
                .await
                .unwrap();
            assert_eq!(handle.id(), "e1");
            assert_eq!(
                driver.history(),
                vec![
                    "find:id=late",
                    "find:xpath=//*[@resource-id='late']",
                    "find:id=late",
                    "find:xpath=//*[@resource-id='late']",
                ]
            );
            assert_eq!(clock.sleep_count(), 1);
        }

        #[tokio::test]
        async fn test_native_hit_skips_fallback() {
            let (waiter, driver, _) = fixture(
                MockDriver::new().with_element("id", "fast", MockElement::new("e1")),
                EngineConfig::default(),
            );
            waiter
                .wait_for_present(&AbstractLocator::by_id("fast"), ms(1_000))
                .await
                .unwrap();
            assert_eq!(driver.call_count(MockCall::FindElement), 1);
        }

        #[tokio::test]
        async fn test_hidden_element_is_not_visible() {
            let (waiter, _, _) = fixture(
                MockDriver::new().with_element(
                    "accessibility id",
                    "ghost",
                    MockElement::new("e1").hidden(),
                ),
                EngineConfig::default(),
            );
            let locator = AbstractLocator::by_accessibility_id("ghost");
            assert!(waiter.wait_for_present(&locator, ms(1_000)).await.is_ok());
            let err = waiter.wait_for_visible(&locator, ms(1_000)).await.unwrap_err();
            assert!(err.to_string().contains("is not visible"));
        }

        #[tokio::test]
        async fn test_text_contains_is_case_sensitive() {
            let (waiter, _, _) = fixture(
                MockDriver::new().with_element(
                    "accessibility id",
                    "banner",
                    MockElement::new("e1").with_text("Welcome back, Ada"),
                ),
                EngineConfig::default(),
            );
            let locator = AbstractLocator::by_accessibility_id("banner");
            assert!(waiter.wait_for_text(&locator, "back, Ada", ms(1_000)).await.is_ok());
            assert!(waiter.wait_for_text(&locator, "welcome", ms(1_000)).await.is_err());
        }

        #[tokio::test]
        async fn test_clickable_equals_present() {
            let (waiter, driver, _) = fixture(
                MockDriver::new().with_element("id", "btn", MockElement::new("e1").hidden()),
                EngineConfig::default(),
            );
            waiter
                .wait_for_clickable(&AbstractLocator::by_id("btn"), ms(1_000))
                .await
                .unwrap();
            assert!(!driver.was_called(MockCall::IsDisplayed));
        }

        #[tokio::test]
        async fn test_empty_locator_is_fatal_without_driver_calls() {
            let (waiter, driver, _) = fixture(MockDriver::new(), EngineConfig::default());
            let err = waiter
                .wait_for_present(&AbstractLocator::by_id("  "), ms(1_000))
                .await
                .unwrap_err();
            assert!(matches!(err, TaplineError::UnsupportedLocator { .. }));
            assert!(driver.history().is_empty());
        }

        #[tokio::test]
        async fn test_zero_timeout_uses_default_budget() {
            let (waiter, driver, clock) = fixture(
                MockDriver::new().with_element("id", "x", MockElement::new("e1")),
                EngineConfig::default(),
            );
            let handle = waiter
                .wait_for_present(&AbstractLocator::by_id("x"), Some(Duration::ZERO))
                .await
                .unwrap();
            assert_eq!(handle.id(), "e1");
            assert_eq!(driver.call_count(MockCall::FindElement), 1);

            let err = waiter
                .wait_for_present(&AbstractLocator::by_id("gone"), Some(Duration::ZERO))
                .await
                .unwrap_err();
            let TaplineError::NotFound { elapsed_ms, .. } = err else {
                panic!("expected NotFound");
            };
            assert!((10_000..=10_500).contains(&elapsed_ms), "elapsed {elapsed_ms}");
            assert!(clock.sleep_count() > 0);
        }

        #[tokio::test]
        async fn test_stale_displayed_check_retries_next_round() {
            let (waiter, driver, clock) = fixture(
                MockDriver::new().with_element(
                    "accessibility id",
                    "card",
                    MockElement::new("e1"),
                ),
                EngineConfig::default(),
            );
            driver.fail_next(MockCall::IsDisplayed, DriverError::stale("re-rendered"));
            let handle = waiter
                .wait_for_visible(&AbstractLocator::by_accessibility_id("card"), ms(2_000))
                .await
                .unwrap();
            assert_eq!(handle.id(), "e1");
            assert_eq!(driver.call_count(MockCall::IsDisplayed), 2);
            assert_eq!(clock.sleep_count(), 1);
        }

        #[tokio::test]
        async fn test_inactive_session_is_fatal() {
            let (waiter, driver, _) = fixture(MockDriver::new(), EngineConfig::default());
            driver.set_session_active(false);
            let err = waiter
                .wait_for_present(&AbstractLocator::by_id("x"), ms(1_000))
                .await
                .unwrap_err();
            assert!(matches!(err, TaplineError::SessionNotActive { .. }));
            assert!(driver.history().is_empty());
        }

        #[tokio::test]
        async fn test_session_loss_mid_poll_aborts() {
            let (waiter, driver, clock) = fixture(MockDriver::new(), EngineConfig::default());
            driver.fail_next(MockCall::FindElement, DriverError::invalid_session("terminated"));
            let err = waiter
                .wait_for_present(&AbstractLocator::by_id("x"), ms(5_000))
                .await
                .unwrap_err();
            assert!(matches!(err, TaplineError::SessionNotActive { .. }));
            assert_eq!(driver.call_count(MockCall::FindElement), 1);
            assert_eq!(clock.sleep_count(), 0);
        }
    }

    // =========================================================================
    // ABSENCE AND IMMEDIATE PROBES
    // =========================================================================

    mod absence_tests {
        use super::*;

        #[tokio::test]
        async fn test_absent_locator_succeeds_first_round() {
            let (waiter, _, clock) = fixture(MockDriver::new(), EngineConfig::default());
            waiter
                .wait_until_absent(&AbstractLocator::by_id("spinner"), ms(3_000))
                .await
                .unwrap();
            assert_eq!(clock.sleep_count(), 0);
        }

        #[tokio::test]
        async fn test_zero_timeout_absent_succeeds_first_round() {
            let (waiter, driver, clock) = fixture(MockDriver::new(), EngineConfig::default());
            waiter
                .wait_until_absent(&AbstractLocator::by_id("nothing"), Some(Duration::ZERO))
                .await
                .unwrap();
            assert_eq!(driver.call_count(MockCall::FindElement), 2);
            assert_eq!(clock.sleep_count(), 0);
        }

        #[tokio::test]
        async fn test_waits_for_element_to_vanish() {
            let (waiter, _, clock) = fixture(
                MockDriver::new().with_element(
                    "id",
                    "spinner",
                    MockElement::new("e1").vanishing_after(2),
                ),
                EngineConfig::default(),
            );
            waiter
                .wait_until_absent(&AbstractLocator::by_id("spinner"), ms(3_000))
                .await
                .unwrap();
            assert_eq!(clock.sleep_count(), 2);
        }

        #[tokio::test]
        async fn test_still_present_at_deadline() {
            let (waiter, _, _) = fixture(
                MockDriver::new().with_element("id", "spinner", MockElement::new("e1")),
                EngineConfig::default(),
            );
            let err = waiter
                .wait_until_absent(&AbstractLocator::by_id("spinner"), ms(1_000))
                .await
                .unwrap_err();
            assert!(matches!(err, TaplineError::StillPresent { elapsed_ms: 1_000, .. }));
        }

        #[tokio::test]
        async fn test_find_immediate_never_sleeps() {
            let (waiter, _, clock) = fixture(MockDriver::new(), EngineConfig::default());
            let found = waiter
                .find_immediate(&AbstractLocator::by_id("x"), &Readiness::Visible)
                .await
                .unwrap();
            assert!(found.is_none());
            assert_eq!(clock.now_ms(), 0);
        }

        #[tokio::test]
        async fn test_is_displayed_never_fails() {
            let (waiter, driver, clock) = fixture(
                MockDriver::new()
                    .with_element("id", "shown", MockElement::new("e1"))
                    .with_element("id", "hidden", MockElement::new("e2").hidden()),
                EngineConfig::default(),
            );
            assert!(waiter.is_displayed(&AbstractLocator::by_id("shown"), None).await);
            assert!(!waiter.is_displayed(&AbstractLocator::by_id("hidden"), None).await);
            assert!(!waiter.is_displayed(&AbstractLocator::by_id("absent"), None).await);
            assert_eq!(clock.now_ms(), 2_000);

            driver.set_session_active(false);
            assert!(!waiter.is_displayed(&AbstractLocator::by_id("shown"), None).await);
        }
    }
}
