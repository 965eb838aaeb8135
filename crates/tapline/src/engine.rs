//! Engine facade used by page objects.
//!
//! ```
//! use std::sync::Arc;
//! use tapline::prelude::*;
//!
//! # tokio_test_block(async {
//! let driver = Arc::new(
//!     MockDriver::new().with_element("id", "com.app:id/login", MockElement::new("btn")),
//! );
//! let engine = Engine::with_clock(driver, Arc::new(FakeClock::new()), EngineConfig::default())?;
//! let report = engine.click(&AbstractLocator::by_id("com.app:id/login"), None).await?;
//! assert_eq!(report.mechanism, "native-click");
//! # Ok::<(), TaplineError>(())
//! # });
//! # fn tokio_test_block<F: std::future::Future<Output = Result<(), TaplineError>>>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f).unwrap();
//! # }
//! ```

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::driver::{ElementHandle, RemoteDriver};
use crate::gesture::{Direction, SwipePlan};
use crate::interaction::{ActionReport, Interactor};
use crate::locator::AbstractLocator;
use crate::result::TaplineResult;
use crate::scroll::ScrollSearch;
use crate::wait::{Readiness, Waiter};
use std::sync::Arc;
use std::time::Duration;

/// Element resolution and interaction engine for one driver session
#[derive(Debug, Clone)]
pub struct Engine {
    waiter: Waiter,
    interactor: Interactor,
    scroller: ScrollSearch,
}

impl Engine {
    /// Create an engine on the system clock
    pub fn new(driver: Arc<dyn RemoteDriver>, config: EngineConfig) -> TaplineResult<Self> {
        Self::with_clock(driver, Arc::new(SystemClock::new()), config)
    }

    /// Create an engine on an explicit clock
    pub fn with_clock(
        driver: Arc<dyn RemoteDriver>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> TaplineResult<Self> {
        config.validate()?;
        tracing::debug!(
            platform = %config.platform,
            default_timeout_ms = config.default_timeout_ms,
            poll_interval_ms = config.poll_interval_ms,
            "Engine created"
        );
        let waiter = Waiter::new(driver, clock, config);
        Ok(Self {
            interactor: Interactor::new(waiter.clone()),
            scroller: ScrollSearch::new(waiter.clone()),
            waiter,
        })
    }

    /// Effective configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        self.waiter.config()
    }

    // ------------------------------------------------------------------
    // Waiting
    // ------------------------------------------------------------------

    /// Poll until `readiness` holds
    pub async fn wait_until(
        &self,
        locator: &AbstractLocator,
        readiness: &Readiness,
        timeout: Option<Duration>,
    ) -> TaplineResult<ElementHandle> {
        self.waiter.wait_until(locator, readiness, timeout).await
    }

    /// Wait for presence
    pub async fn wait_for_present(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<ElementHandle> {
        self.waiter.wait_for_present(locator, timeout).await
    }

    /// Wait for visibility
    pub async fn wait_for_visible(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<ElementHandle> {
        self.waiter.wait_for_visible(locator, timeout).await
    }

    /// Wait for clickability
    pub async fn wait_for_clickable(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<ElementHandle> {
        self.waiter.wait_for_clickable(locator, timeout).await
    }

    /// Wait for text
    pub async fn wait_for_text(
        &self,
        locator: &AbstractLocator,
        text: &str,
        timeout: Option<Duration>,
    ) -> TaplineResult<ElementHandle> {
        self.waiter.wait_for_text(locator, text, timeout).await
    }

    /// Wait for disappearance
    pub async fn wait_until_absent(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<()> {
        self.waiter.wait_until_absent(locator, timeout).await
    }

    /// Presence-and-displayed probe that never fails
    pub async fn is_displayed(&self, locator: &AbstractLocator, timeout: Option<Duration>) -> bool {
        self.waiter.is_displayed(locator, timeout).await
    }

    // ------------------------------------------------------------------
    // Interactions
    // ------------------------------------------------------------------

    /// Click
    pub async fn click(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<ActionReport> {
        self.interactor.click(locator, timeout).await
    }

    /// Click the first locator that works
    pub async fn click_any(
        &self,
        locators: &[AbstractLocator],
        timeout: Option<Duration>,
    ) -> TaplineResult<ActionReport> {
        self.interactor.click_any(locators, timeout).await
    }

    /// Clear and type
    pub async fn send_keys(
        &self,
        locator: &AbstractLocator,
        text: &str,
        timeout: Option<Duration>,
    ) -> TaplineResult<ActionReport> {
        self.interactor.send_keys(locator, text, timeout).await
    }

    /// Type into the first locator that works
    pub async fn send_keys_any(
        &self,
        locators: &[AbstractLocator],
        text: &str,
        timeout: Option<Duration>,
    ) -> TaplineResult<ActionReport> {
        self.interactor.send_keys_any(locators, text, timeout).await
    }

    /// Read text
    pub async fn get_text(
        &self,
        locator: &AbstractLocator,
        timeout: Option<Duration>,
    ) -> TaplineResult<String> {
        self.interactor.get_text(locator, timeout).await
    }

    /// Read text from the first locator that works
    pub async fn get_text_any(
        &self,
        locators: &[AbstractLocator],
        timeout: Option<Duration>,
    ) -> TaplineResult<String> {
        self.interactor.get_text_any(locators, timeout).await
    }

    /// Tap a viewport point
    pub async fn tap_at(&self, x: f64, y: f64) -> TaplineResult<ActionReport> {
        self.interactor.tap_at(x, y).await
    }

    /// Press and hold
    pub async fn long_press(
        &self,
        locator: &AbstractLocator,
        duration: Duration,
        timeout: Option<Duration>,
    ) -> TaplineResult<ActionReport> {
        self.interactor.long_press(locator, duration, timeout).await
    }

    /// Dismiss the soft keyboard
    pub async fn hide_keyboard(&self) -> TaplineResult<&'static str> {
        self.interactor.hide_keyboard().await
    }

    // ------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------

    /// Swipe until the element is visible
    pub async fn scroll_to_element(
        &self,
        locator: &AbstractLocator,
        direction: Direction,
        max_swipes: u32,
    ) -> TaplineResult<ElementHandle> {
        self.scroller
            .scroll_to_element(locator, direction, max_swipes)
            .await
    }

    /// One swipe
    pub async fn swipe(&self, direction: Direction) -> TaplineResult<SwipePlan> {
        self.scroller.swipe(direction).await
    }
}
