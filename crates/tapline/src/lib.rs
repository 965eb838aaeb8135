//! Tapline: Element Resolution and Interaction Engine for Mobile UI Tests
//!
//! Tapline sits between page objects and an Appium-style remote session.
//! It expands abstract locators into lookup strategies, polls under a
//! timeout budget until a readiness predicate holds, and performs taps and
//! typing through ordered fallback chains with bounded retry of transient
//! errors.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    TAPLINE Architecture                         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Page       │    │ Engine     │    │ Remote     │            │
//! │   │ Object     │───►│ Waiter     │───►│ Driver     │            │
//! │   │            │    │ Interactor │    │ (session)  │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │                           │                                     │
//! │                     Clock (injected)                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod actions;
pub mod clock;
pub mod config;
pub mod driver;
pub mod engine;
pub mod fallback;
pub mod gesture;
pub mod interaction;
pub mod locator;
pub mod mock;
pub mod platform;
mod result;
pub mod scroll;
pub mod wait;

pub use actions::{KeySequence, Point, PointerSequence};
pub use clock::{Clock, FakeClock, SharedClock, SystemClock};
pub use config::{EngineConfig, RetryPolicy, SwipeConfig};
pub use driver::{
    DriverError, DriverErrorKind, DriverResult, ElementHandle, RemoteDriver, WindowSize,
};
pub use engine::Engine;
pub use fallback::{FallbackChain, Mechanism, MechanismFailure};
pub use gesture::{Direction, SwipePlan};
pub use interaction::{ActionReport, Interactor};
pub use locator::{AbstractLocator, CandidateRank, StrategyCandidate};
pub use mock::{MockCall, MockDriver, MockElement};
pub use platform::Platform;
pub use result::{TaplineError, TaplineResult};
pub use scroll::ScrollSearch;
pub use wait::{Readiness, TimeoutBudget, Waiter};

/// Common imports for page objects and tests
pub mod prelude {
    pub use super::actions::{KeySequence, Point, PointerSequence};
    pub use super::clock::{Clock, FakeClock, SystemClock};
    pub use super::config::{EngineConfig, RetryPolicy, SwipeConfig};
    pub use super::driver::{DriverError, DriverErrorKind, ElementHandle, RemoteDriver, WindowSize};
    pub use super::engine::Engine;
    pub use super::gesture::Direction;
    pub use super::interaction::ActionReport;
    pub use super::locator::{AbstractLocator, StrategyCandidate};
    pub use super::mock::{MockCall, MockDriver, MockElement};
    pub use super::platform::Platform;
    pub use super::result::{TaplineError, TaplineResult};
    pub use super::wait::Readiness;
}
