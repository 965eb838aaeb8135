//! Ordered fallback chains.
//!
//! A [`FallbackChain`] holds the alternative ways of performing one action
//! (native click, then synthesized tap, ...). Mechanisms run in order:
//!
//! - success stops the chain;
//! - a transient or session error stops the chain and is returned as-is, the
//!   handle is no longer usable and the caller has to re-resolve;
//! - any other error is recorded and the next mechanism runs.
//!
//! When every mechanism fails the caller gets
//! [`TaplineError::FallbackExhausted`] with each mechanism's failure.

use crate::driver::{DriverResult, RemoteDriver};
use crate::result::{TaplineError, TaplineResult};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// One way of performing an action on a target
#[async_trait]
pub trait Mechanism<T: ?Sized + Sync>: Send + Sync {
    /// Stable mechanism name used in logs and reports
    fn name(&self) -> &'static str;

    /// Try the action once
    async fn attempt(&self, driver: &dyn RemoteDriver, target: &T) -> DriverResult<()>;
}

/// Failure of one mechanism inside an exhausted chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MechanismFailure {
    /// Mechanism name
    pub mechanism: String,
    /// Error message
    pub message: String,
}

impl MechanismFailure {
    /// Create a new failure record
    #[must_use]
    pub fn new(mechanism: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            mechanism: mechanism.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for MechanismFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.mechanism, self.message)
    }
}

/// Ordered list of mechanisms for one action
pub struct FallbackChain<T: ?Sized> {
    action: &'static str,
    mechanisms: Vec<Box<dyn Mechanism<T>>>,
}

impl<T: ?Sized + Sync> FallbackChain<T> {
    /// Create an empty chain
    #[must_use]
    pub fn new(action: &'static str) -> Self {
        Self {
            action,
            mechanisms: Vec::new(),
        }
    }

    /// Append a mechanism
    #[must_use]
    pub fn with(mut self, mechanism: impl Mechanism<T> + 'static) -> Self {
        self.mechanisms.push(Box::new(mechanism));
        self
    }

    /// Action name
    #[must_use]
    pub const fn action(&self) -> &'static str {
        self.action
    }

    /// Mechanism names in order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.mechanisms.iter().map(|m| m.name()).collect()
    }

    /// Run the chain, returning the name of the mechanism that succeeded
    pub async fn run(&self, driver: &dyn RemoteDriver, target: &T) -> TaplineResult<&'static str> {
        let mut failures = Vec::new();
        for mechanism in &self.mechanisms {
            let name = mechanism.name();
            match mechanism.attempt(driver, target).await {
                Ok(()) => {
                    if !failures.is_empty() {
                        tracing::info!(
                            action = self.action,
                            mechanism = name,
                            skipped = failures.len(),
                            "Fallback mechanism succeeded"
                        );
                    }
                    return Ok(name);
                }
                Err(err) if err.is_transient() => {
                    tracing::debug!(
                        action = self.action,
                        mechanism = name,
                        error = %err,
                        "Transient error, abandoning chain"
                    );
                    return Err(err.into());
                }
                Err(err) => {
                    let err = TaplineError::from(err);
                    if err.is_fatal() {
                        return Err(err);
                    }
                    tracing::warn!(
                        action = self.action,
                        mechanism = name,
                        error = %err,
                        "Mechanism failed, trying next"
                    );
                    let message = match err {
                        TaplineError::Driver(inner) => inner.to_string(),
                        other => other.to_string(),
                    };
                    failures.push(MechanismFailure::new(name, message));
                }
            }
        }
        Err(TaplineError::FallbackExhausted {
            action: self.action.to_string(),
            chain: failures,
        })
    }
}

impl<T: ?Sized + Sync> fmt::Debug for FallbackChain<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.mechanisms.iter().map(|m| m.name()).collect();
        f.debug_struct("FallbackChain")
            .field("action", &self.action)
            .field("mechanisms", &names)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{DriverError, ElementHandle};
    use crate::mock::MockDriver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Scripted {
        name: &'static str,
        outcome: Option<DriverError>,
        calls: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn ok(name: &'static str, calls: &Arc<AtomicUsize>) -> Self {
            Self {
                name,
                outcome: None,
                calls: Arc::clone(calls),
            }
        }

        fn failing(name: &'static str, err: DriverError, calls: &Arc<AtomicUsize>) -> Self {
            Self {
                name,
                outcome: Some(err),
                calls: Arc::clone(calls),
            }
        }
    }

    #[async_trait]
    impl Mechanism<ElementHandle> for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn attempt(
            &self,
            _driver: &dyn RemoteDriver,
            _target: &ElementHandle,
        ) -> DriverResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                None => Ok(()),
                Some(err) => Err(err.clone()),
            }
        }
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FallbackChain::new("click")
            .with(Scripted::ok("a", &calls))
            .with(Scripted::ok("b", &calls));
        let used = chain.run(&MockDriver::new(), &ElementHandle::new("1")).await.unwrap();
        assert_eq!(used, "a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_falls_through_non_transient() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FallbackChain::new("click")
            .with(Scripted::failing("a", DriverError::unsupported("nope"), &calls))
            .with(Scripted::ok("b", &calls));
        let used = chain.run(&MockDriver::new(), &ElementHandle::new("1")).await.unwrap();
        assert_eq!(used, "b");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_transient_stops_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FallbackChain::new("click")
            .with(Scripted::failing("a", DriverError::stale("gone"), &calls))
            .with(Scripted::ok("b", &calls));
        let err = chain.run(&MockDriver::new(), &ElementHandle::new("1")).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_session_loss_stops_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FallbackChain::new("click")
            .with(Scripted::failing("a", DriverError::invalid_session("gone"), &calls))
            .with(Scripted::ok("b", &calls));
        let err = chain.run(&MockDriver::new(), &ElementHandle::new("1")).await.unwrap_err();
        assert!(matches!(err, TaplineError::SessionNotActive { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_reports_every_mechanism() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FallbackChain::new("type")
            .with(Scripted::failing("a", DriverError::unsupported("no a"), &calls))
            .with(Scripted::failing("b", DriverError::other("no b"), &calls));
        let err = chain.run(&MockDriver::new(), &ElementHandle::new("1")).await.unwrap_err();
        match err {
            TaplineError::FallbackExhausted { action, chain } => {
                assert_eq!(action, "type");
                assert_eq!(
                    chain,
                    vec![
                        MechanismFailure::new("a", "unsupported: no a"),
                        MechanismFailure::new("b", "driver error: no b"),
                    ]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_chain_is_exhausted() {
        let chain: FallbackChain<ElementHandle> = FallbackChain::new("noop");
        let err = chain.run(&MockDriver::new(), &ElementHandle::new("1")).await.unwrap_err();
        assert!(err.to_string().contains("no mechanisms configured"));
    }

    #[test]
    fn test_debug_lists_names() {
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = FallbackChain::new("click").with(Scripted::ok("native", &calls));
        assert_eq!(chain.names(), vec!["native"]);
        assert!(format!("{chain:?}").contains("native"));
    }
}
