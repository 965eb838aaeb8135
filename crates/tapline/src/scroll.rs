//! Swipe-driven search for off-screen elements.

use crate::driver::ElementHandle;
use crate::gesture::{self, Direction, SwipePlan};
use crate::locator::AbstractLocator;
use crate::result::{TaplineError, TaplineResult};
use crate::wait::{Readiness, Waiter};

/// Swipes until an element becomes visible
#[derive(Debug, Clone)]
pub struct ScrollSearch {
    waiter: Waiter,
}

impl ScrollSearch {
    /// Create a scroll search on top of a waiter
    #[must_use]
    pub const fn new(waiter: Waiter) -> Self {
        Self { waiter }
    }

    /// Probe, swipe, probe again, up to `max_swipes` swipes.
    ///
    /// One last probe runs after the final swipe; no extra swipe is made.
    pub async fn scroll_to_element(
        &self,
        locator: &AbstractLocator,
        direction: Direction,
        max_swipes: u32,
    ) -> TaplineResult<ElementHandle> {
        let mut swipes = 0;
        while swipes < max_swipes {
            if let Some(element) = self.waiter.find_immediate(locator, &Readiness::Visible).await? {
                tracing::info!(locator = %locator, swipes, "Scrolled to element");
                return Ok(element);
            }
            self.swipe(direction).await?;
            swipes += 1;
            tracing::debug!(
                locator = %locator,
                direction = %direction,
                swipes,
                max_swipes,
                "Swiped, probing again"
            );
        }

        if let Some(element) = self.waiter.find_immediate(locator, &Readiness::Visible).await? {
            tracing::info!(locator = %locator, swipes, "Scrolled to element");
            return Ok(element);
        }
        tracing::warn!(locator = %locator, max_swipes, "Swipe budget exhausted");
        Err(TaplineError::SwipeBudgetExhausted {
            locator: locator.to_string(),
            max_swipes,
        })
    }

    /// One swipe across the viewport
    pub async fn swipe(&self, direction: Direction) -> TaplineResult<SwipePlan> {
        self.waiter.ensure_session()?;
        gesture::swipe(
            self.waiter.driver(),
            self.waiter.clock(),
            self.waiter.config(),
            direction,
        )
        .await
    }
}
