//! Touch gestures: swipe geometry, taps, long press and keyboard dismissal.
//!
//! Every gesture is a [`FallbackChain`]: the platform's vendor command where
//! one exists, a generic W3C pointer sequence otherwise.

use crate::actions::{Point, PointerSequence};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::driver::{DriverResult, ElementHandle, RemoteDriver, WindowSize};
use crate::fallback::{FallbackChain, Mechanism};
use crate::platform::Platform;
use crate::result::{TaplineError, TaplineResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Vendor swipe command
pub const VENDOR_SWIPE: &str = "mobile: swipe";
/// Vendor tap command
pub const VENDOR_TAP: &str = "mobile: tap";
/// Vendor long click command
pub const VENDOR_LONG_CLICK: &str = "mobile: longClick";
/// Vendor hide keyboard command
pub const VENDOR_HIDE_KEYBOARD: &str = "mobile: hideKeyboard";
/// Vendor type text command
pub const VENDOR_TYPE_TEXT: &str = "mobile: typeText";
/// Android BACK key code
pub const ANDROID_BACK_KEY_CODE: u32 = 4;

/// Near edge of a swipe, as a fraction of the screen
const SWIPE_EDGE: f64 = 0.2;
/// Far edge of a swipe, as a fraction of the screen
const SWIPE_FAR_EDGE: f64 = 0.8;

// ============================================================================
// Direction and geometry
// ============================================================================

/// Swipe direction (finger travel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Bottom to top
    Up,
    /// Top to bottom
    Down,
    /// Right to left
    Left,
    /// Left to right
    Right,
}

impl Direction {
    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl FromStr for Direction {
    type Err = TaplineError;

    fn from_str(s: &str) -> TaplineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(TaplineError::invalid_argument(format!(
                "Invalid swipe direction: {s}"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete swipe: where it starts, where it ends, how long it takes
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwipePlan {
    /// Direction
    pub direction: Direction,
    /// Start point
    pub start: Point,
    /// End point
    pub end: Point,
    /// Gesture duration
    pub duration_ms: u64,
}

impl SwipePlan {
    /// Compute the swipe for a viewport; `distance` is a screen fraction
    #[must_use]
    pub fn compute(
        size: WindowSize,
        direction: Direction,
        distance: f64,
        duration_ms: u64,
    ) -> Self {
        let w = f64::from(size.width);
        let h = f64::from(size.height);
        let (start, end) = match direction {
            Direction::Up => (
                Point::new(w / 2.0, h * SWIPE_FAR_EDGE),
                Point::new(w / 2.0, h * (SWIPE_FAR_EDGE - distance)),
            ),
            Direction::Down => (
                Point::new(w / 2.0, h * SWIPE_EDGE),
                Point::new(w / 2.0, h * (SWIPE_EDGE + distance)),
            ),
            Direction::Left => (
                Point::new(w * SWIPE_FAR_EDGE, h / 2.0),
                Point::new(w * (SWIPE_FAR_EDGE - distance), h / 2.0),
            ),
            Direction::Right => (
                Point::new(w * SWIPE_EDGE, h / 2.0),
                Point::new(w * (SWIPE_EDGE + distance), h / 2.0),
            ),
        };
        Self {
            direction,
            start,
            end,
            duration_ms,
        }
    }

    /// Parameters of the platform's `mobile: swipe` command
    #[must_use]
    pub fn vendor_params(&self, platform: Platform) -> serde_json::Value {
        match platform {
            Platform::Android => json!({
                "startX": self.start.x.round() as i64,
                "startY": self.start.y.round() as i64,
                "endX": self.end.x.round() as i64,
                "endY": self.end.y.round() as i64,
                "duration": self.duration_ms,
            }),
            Platform::Ios => json!({ "direction": self.direction.as_str() }),
        }
    }

    /// Generic W3C pointer swipe
    #[must_use]
    pub fn pointer_sequence(&self) -> PointerSequence {
        PointerSequence::swipe(self.start, self.end, self.duration_ms)
    }
}

// ============================================================================
// Swipe
// ============================================================================

/// Target of the swipe chain
#[derive(Debug, Clone, Copy)]
pub struct SwipeTarget {
    /// Geometry
    pub plan: SwipePlan,
    /// Platform selecting the vendor payload
    pub platform: Platform,
}

struct VendorSwipe;

#[async_trait]
impl Mechanism<SwipeTarget> for VendorSwipe {
    fn name(&self) -> &'static str {
        "vendor-swipe"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, target: &SwipeTarget) -> DriverResult<()> {
        driver
            .execute_vendor_command(VENDOR_SWIPE, target.plan.vendor_params(target.platform))
            .await
            .map(|_| ())
    }
}

struct PointerSwipe;

#[async_trait]
impl Mechanism<SwipeTarget> for PointerSwipe {
    fn name(&self) -> &'static str {
        "pointer-swipe"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, target: &SwipeTarget) -> DriverResult<()> {
        driver
            .perform_pointer_actions(&target.plan.pointer_sequence())
            .await
    }
}

/// Vendor swipe, then pointer swipe
#[must_use]
pub fn swipe_chain() -> FallbackChain<SwipeTarget> {
    FallbackChain::new("swipe").with(VendorSwipe).with(PointerSwipe)
}

/// Swipe once across the viewport and let the UI settle
pub async fn swipe(
    driver: &dyn RemoteDriver,
    clock: &dyn Clock,
    config: &EngineConfig,
    direction: Direction,
) -> TaplineResult<SwipePlan> {
    let size = driver.window_size().await?;
    let plan = SwipePlan::compute(size, direction, config.swipe.distance, config.swipe.duration_ms);
    let target = SwipeTarget {
        plan,
        platform: config.platform,
    };
    let mechanism = swipe_chain().run(driver, &target).await?;
    tracing::debug!(
        direction = %direction,
        mechanism,
        start_x = plan.start.x,
        start_y = plan.start.y,
        end_x = plan.end.x,
        end_y = plan.end.y,
        "Swiped"
    );
    clock.sleep(config.swipe.settle()).await;
    Ok(plan)
}

// ============================================================================
// Tap at point
// ============================================================================

struct PointerTapAt;

#[async_trait]
impl Mechanism<Point> for PointerTapAt {
    fn name(&self) -> &'static str {
        "pointer-tap"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, target: &Point) -> DriverResult<()> {
        driver.perform_pointer_actions(&PointerSequence::tap_point(*target)).await
    }
}

struct VendorTap;

#[async_trait]
impl Mechanism<Point> for VendorTap {
    fn name(&self) -> &'static str {
        "vendor-tap"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, target: &Point) -> DriverResult<()> {
        let params = json!({ "x": target.x.round() as i64, "y": target.y.round() as i64 });
        driver.execute_vendor_command(VENDOR_TAP, params).await.map(|_| ())
    }
}

/// Pointer tap, then vendor tap
#[must_use]
pub fn tap_chain() -> FallbackChain<Point> {
    FallbackChain::new("tap").with(PointerTapAt).with(VendorTap)
}

// ============================================================================
// Long press
// ============================================================================

/// Target of the long press chain
#[derive(Debug, Clone)]
pub struct LongPressTarget {
    /// Element to press
    pub element: ElementHandle,
    /// Hold duration
    pub duration_ms: u64,
}

struct VendorLongClick;

#[async_trait]
impl Mechanism<LongPressTarget> for VendorLongClick {
    fn name(&self) -> &'static str {
        "vendor-long-click"
    }

    async fn attempt(
        &self,
        driver: &dyn RemoteDriver,
        target: &LongPressTarget,
    ) -> DriverResult<()> {
        let params = json!({
            "elementId": target.element.id(),
            "duration": target.duration_ms,
        });
        driver
            .execute_vendor_command(VENDOR_LONG_CLICK, params)
            .await
            .map(|_| ())
    }
}

struct PointerLongPress;

#[async_trait]
impl Mechanism<LongPressTarget> for PointerLongPress {
    fn name(&self) -> &'static str {
        "pointer-long-press"
    }

    async fn attempt(
        &self,
        driver: &dyn RemoteDriver,
        target: &LongPressTarget,
    ) -> DriverResult<()> {
        let sequence = PointerSequence::long_press_element(&target.element, target.duration_ms);
        driver.perform_pointer_actions(&sequence).await
    }
}

/// Vendor long click, then pointer press-and-hold
#[must_use]
pub fn long_press_chain() -> FallbackChain<LongPressTarget> {
    FallbackChain::new("long press")
        .with(VendorLongClick)
        .with(PointerLongPress)
}

// ============================================================================
// Hide keyboard
// ============================================================================

struct DriverHideKeyboard;

#[async_trait]
impl Mechanism<()> for DriverHideKeyboard {
    fn name(&self) -> &'static str {
        "driver-hide-keyboard"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, _target: &()) -> DriverResult<()> {
        driver.hide_keyboard().await
    }
}

struct VendorHideKeyboard;

#[async_trait]
impl Mechanism<()> for VendorHideKeyboard {
    fn name(&self) -> &'static str {
        "vendor-hide-keyboard"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, _target: &()) -> DriverResult<()> {
        driver
            .execute_vendor_command(VENDOR_HIDE_KEYBOARD, json!({}))
            .await
            .map(|_| ())
    }
}

struct BackKey;

#[async_trait]
impl Mechanism<()> for BackKey {
    fn name(&self) -> &'static str {
        "back-key"
    }

    async fn attempt(&self, driver: &dyn RemoteDriver, _target: &()) -> DriverResult<()> {
        driver.press_key_code(ANDROID_BACK_KEY_CODE).await
    }
}

/// Driver primitive, vendor command, then the Android back key
#[must_use]
pub fn hide_keyboard_chain() -> FallbackChain<()> {
    FallbackChain::new("hide keyboard")
        .with(DriverHideKeyboard)
        .with(VendorHideKeyboard)
        .with(BackKey)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::mock::{MockCall, MockDriver};

    const PHONE: WindowSize = WindowSize::new(1000, 2000);

    // ========================================================================
    // Geometry
    // ========================================================================

    mod geometry_tests {
        use super::*;

        fn assert_near(actual: Point, x: f64, y: f64) {
            assert!(
                (actual.x - x).abs() < 1e-6 && (actual.y - y).abs() < 1e-6,
                "expected ({x}, {y}), got ({}, {})",
                actual.x,
                actual.y
            );
        }

        #[test]
        fn test_directions() {
            let up = SwipePlan::compute(PHONE, Direction::Up, 0.5, 300);
            assert_near(up.start, 500.0, 1600.0);
            assert_near(up.end, 500.0, 600.0);

            let down = SwipePlan::compute(PHONE, Direction::Down, 0.5, 300);
            assert_near(down.start, 500.0, 400.0);
            assert_near(down.end, 500.0, 1400.0);

            let left = SwipePlan::compute(PHONE, Direction::Left, 0.5, 300);
            assert_near(left.start, 800.0, 1000.0);
            assert_near(left.end, 300.0, 1000.0);

            let right = SwipePlan::compute(PHONE, Direction::Right, 0.5, 300);
            assert_near(right.start, 200.0, 1000.0);
            assert_near(right.end, 700.0, 1000.0);
        }

        #[test]
        fn test_shorter_distance() {
            let plan = SwipePlan::compute(PHONE, Direction::Up, 0.25, 300);
            assert_near(plan.end, 500.0, 1100.0);
        }

        #[test]
        fn test_vendor_params_per_platform() {
            let plan = SwipePlan::compute(PHONE, Direction::Up, 0.5, 300);
            assert_eq!(
                plan.vendor_params(Platform::Android),
                json!({"startX": 500, "startY": 1600, "endX": 500, "endY": 600, "duration": 300})
            );
            assert_eq!(plan.vendor_params(Platform::Ios), json!({"direction": "up"}));
        }

        #[test]
        fn test_parse_direction() {
            assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
            assert_eq!(" left".parse::<Direction>().unwrap(), Direction::Left);
            let err = "sideways".parse::<Direction>().unwrap_err();
            assert!(matches!(err, TaplineError::InvalidArgument { .. }));
            assert!(err.to_string().contains("sideways"));
        }
    }

    // ========================================================================
    // Chains
    // ========================================================================

    mod chain_tests {
        use super::*;

        #[tokio::test]
        async fn test_swipe_uses_vendor_and_settles() {
            let driver = MockDriver::new().with_window_size(1000, 2000);
            let clock = FakeClock::new();
            let config = EngineConfig::default();
            let plan = swipe(&driver, &clock, &config, Direction::Down).await.unwrap();
            assert_eq!(plan.direction, Direction::Down);
            assert_eq!(driver.swipe_count(), 1);
            assert_eq!(driver.vendor_commands()[0].0, VENDOR_SWIPE);
            assert_eq!(clock.total_slept_ms(), 500);
        }

        #[tokio::test]
        async fn test_swipe_falls_back_to_pointer() {
            let driver = MockDriver::new();
            driver.reject_vendor_command(VENDOR_SWIPE);
            let clock = FakeClock::new();
            swipe(&driver, &clock, &EngineConfig::default(), Direction::Up)
                .await
                .unwrap();
            assert_eq!(driver.swipe_count(), 1);
            assert_eq!(driver.call_count(MockCall::PointerActions), 1);
            assert!(driver.pointer_sequences()[0].is_drag());
        }

        #[tokio::test]
        async fn test_swipe_exhausted() {
            let driver = MockDriver::new();
            driver.reject_vendor_command(VENDOR_SWIPE);
            driver.mark_unsupported(MockCall::PointerActions);
            let clock = FakeClock::new();
            let err = swipe(&driver, &clock, &EngineConfig::default(), Direction::Up)
                .await
                .unwrap_err();
            assert!(matches!(err, TaplineError::FallbackExhausted { .. }));
            assert_eq!(clock.sleep_count(), 0);
        }

        #[tokio::test]
        async fn test_ios_swipe_sends_direction() {
            let driver = MockDriver::new();
            let config = EngineConfig::default().with_platform(Platform::Ios);
            swipe(&driver, &FakeClock::new(), &config, Direction::Left)
                .await
                .unwrap();
            assert_eq!(driver.vendor_commands()[0].1, json!({"direction": "left"}));
        }

        #[tokio::test]
        async fn test_tap_falls_back_to_vendor() {
            let driver = MockDriver::new();
            driver.mark_unsupported(MockCall::PointerActions);
            let used = tap_chain().run(&driver, &Point::new(10.4, 20.6)).await.unwrap();
            assert_eq!(used, "vendor-tap");
            assert_eq!(
                driver.vendor_commands()[0],
                (VENDOR_TAP.to_string(), json!({"x": 10, "y": 21}))
            );
        }

        #[tokio::test]
        async fn test_hide_keyboard_reaches_back_key() {
            let driver = MockDriver::new();
            driver.mark_unsupported(MockCall::HideKeyboard);
            driver.reject_vendor_command(VENDOR_HIDE_KEYBOARD);
            let used = hide_keyboard_chain().run(&driver, &()).await.unwrap();
            assert_eq!(used, "back-key");
            assert!(driver.history().contains(&"press_key_code:4".to_string()));
        }

        #[tokio::test]
        async fn test_long_press_vendor_payload() {
            let driver = MockDriver::new();
            let target = LongPressTarget {
                element: ElementHandle::new("e9"),
                duration_ms: 1200,
            };
            long_press_chain().run(&driver, &target).await.unwrap();
            assert_eq!(
                driver.vendor_commands()[0],
                (
                    VENDOR_LONG_CLICK.to_string(),
                    json!({"elementId": "e9", "duration": 1200})
                )
            );
        }
    }
}
