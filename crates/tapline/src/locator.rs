//! Abstract locators and their expansion into lookup strategies.
//!
//! Page objects describe elements with an [`AbstractLocator`]. [`resolve`]
//! turns it into the ordered [`StrategyCandidate`] list the waiter tries on
//! every polling round. An Android resource id, for example, is tried with
//! the native `id` strategy first and an equivalent XPath second:
//!
//! ```
//! use tapline::locator::{AbstractLocator, STRATEGY_ID, STRATEGY_XPATH};
//!
//! let candidates = AbstractLocator::by_id("com.app:id/login").resolve();
//! assert_eq!(candidates[0].strategy, STRATEGY_ID);
//! assert_eq!(candidates[1].strategy, STRATEGY_XPATH);
//! assert_eq!(candidates[1].selector, "//*[@resource-id='com.app:id/login']");
//! ```

use crate::result::{TaplineError, TaplineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Native id strategy
pub const STRATEGY_ID: &str = "id";
/// XPath strategy
pub const STRATEGY_XPATH: &str = "xpath";
/// Accessibility id strategy
pub const STRATEGY_ACCESSIBILITY_ID: &str = "accessibility id";

/// Attribute holding the Android resource id
pub const RESOURCE_ID_ATTRIBUTE: &str = "resource-id";

// ============================================================================
// AbstractLocator
// ============================================================================

/// Platform-neutral element locator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "LocatorRepr", into = "LocatorRepr")]
pub enum AbstractLocator {
    /// Resource id / native id
    Id(String),
    /// XPath expression
    XPath(String),
    /// Accessibility id
    AccessibilityId(String),
    /// Explicit strategy and selector, passed through unchanged
    Raw {
        /// Strategy name
        strategy: String,
        /// Selector value
        selector: String,
    },
}

impl AbstractLocator {
    /// Locate by resource id
    #[must_use]
    pub fn by_id(value: impl Into<String>) -> Self {
        Self::Id(value.into())
    }

    /// Locate by XPath
    #[must_use]
    pub fn by_xpath(value: impl Into<String>) -> Self {
        Self::XPath(value.into())
    }

    /// Locate by accessibility id
    #[must_use]
    pub fn by_accessibility_id(value: impl Into<String>) -> Self {
        Self::AccessibilityId(value.into())
    }

    /// Locate with an explicit strategy
    #[must_use]
    pub fn by_raw(strategy: impl Into<String>, selector: impl Into<String>) -> Self {
        Self::Raw {
            strategy: strategy.into(),
            selector: selector.into(),
        }
    }

    /// Reject empty or whitespace-only fields
    pub fn validate(&self) -> TaplineResult<()> {
        let (field, value) = match self {
            Self::Id(v) => ("id", v),
            Self::XPath(v) => ("xpath", v),
            Self::AccessibilityId(v) => ("accessibility id", v),
            Self::Raw { strategy, selector } => {
                if strategy.trim().is_empty() {
                    return Err(TaplineError::unsupported_locator(
                        "raw locator has an empty strategy",
                    ));
                }
                ("selector", selector)
            }
        };
        if value.trim().is_empty() {
            return Err(TaplineError::unsupported_locator(format!(
                "{field} locator has an empty value"
            )));
        }
        Ok(())
    }

    /// Ordered lookup candidates for this locator
    #[must_use]
    pub fn resolve(&self) -> Vec<StrategyCandidate> {
        resolve(self)
    }
}

impl fmt::Display for AbstractLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(v) => write!(f, "{STRATEGY_ID}={v}"),
            Self::XPath(v) => write!(f, "{STRATEGY_XPATH}={v}"),
            Self::AccessibilityId(v) => write!(f, "{STRATEGY_ACCESSIBILITY_ID}={v}"),
            Self::Raw { strategy, selector } => write!(f, "{strategy}={selector}"),
        }
    }
}

/// Catalog shapes accepted on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LocatorRepr {
    Bare(String),
    Raw { using: String, value: String },
    Keyed(BTreeMap<String, String>),
}

impl TryFrom<LocatorRepr> for AbstractLocator {
    type Error = String;

    fn try_from(repr: LocatorRepr) -> Result<Self, Self::Error> {
        let locator = match repr {
            LocatorRepr::Bare(value) => Self::Id(value),
            LocatorRepr::Raw { using, value } => Self::by_raw(using, value),
            LocatorRepr::Keyed(map) => {
                if map.len() != 1 {
                    return Err(format!(
                        "locator must have exactly one strategy key, found {}",
                        map.len()
                    ));
                }
                let Some((key, value)) = map.into_iter().next() else {
                    return Err("locator has no strategy key".to_string());
                };
                match key.as_str() {
                    "id" | "appium:id" => Self::Id(value),
                    "xpath" => Self::XPath(value),
                    "accessibility id" | "accessibilityId" => Self::AccessibilityId(value),
                    _ => Self::Raw {
                        strategy: key,
                        selector: value,
                    },
                }
            }
        };
        locator.validate().map_err(|e| e.to_string())?;
        Ok(locator)
    }
}

impl From<AbstractLocator> for LocatorRepr {
    fn from(locator: AbstractLocator) -> Self {
        let keyed = |key: &str, value: String| {
            let mut map = BTreeMap::new();
            map.insert(key.to_string(), value);
            Self::Keyed(map)
        };
        match locator {
            AbstractLocator::Id(v) => keyed(STRATEGY_ID, v),
            AbstractLocator::XPath(v) => keyed(STRATEGY_XPATH, v),
            AbstractLocator::AccessibilityId(v) => keyed(STRATEGY_ACCESSIBILITY_ID, v),
            AbstractLocator::Raw { strategy, selector } => Self::Raw {
                using: strategy,
                value: selector,
            },
        }
    }
}

// ============================================================================
// Strategy candidates
// ============================================================================

/// Whether a candidate is the locator's own strategy or a derived fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateRank {
    /// The locator's own strategy
    Primary,
    /// Derived alternative
    Fallback,
}

/// One concrete lookup the driver can execute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrategyCandidate {
    /// Strategy name (`id`, `xpath`, `accessibility id`, ...)
    pub strategy: String,
    /// Selector value
    pub selector: String,
    /// Rank
    pub rank: CandidateRank,
}

impl StrategyCandidate {
    /// Primary candidate
    #[must_use]
    pub fn primary(strategy: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            selector: selector.into(),
            rank: CandidateRank::Primary,
        }
    }

    /// Fallback candidate
    #[must_use]
    pub fn fallback(strategy: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            selector: selector.into(),
            rank: CandidateRank::Fallback,
        }
    }
}

impl fmt::Display for StrategyCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\": \"{}\"", self.strategy, self.selector)
    }
}

/// Expand a locator into ordered candidates
#[must_use]
pub fn resolve(locator: &AbstractLocator) -> Vec<StrategyCandidate> {
    match locator {
        AbstractLocator::Id(v) => vec![
            StrategyCandidate::primary(STRATEGY_ID, v.as_str()),
            StrategyCandidate::fallback(STRATEGY_XPATH, resource_id_xpath(v)),
        ],
        AbstractLocator::XPath(v) => vec![StrategyCandidate::primary(STRATEGY_XPATH, v.as_str())],
        AbstractLocator::AccessibilityId(v) => {
            vec![StrategyCandidate::primary(STRATEGY_ACCESSIBILITY_ID, v.as_str())]
        }
        AbstractLocator::Raw { strategy, selector } => {
            vec![StrategyCandidate::primary(strategy.as_str(), selector.as_str())]
        }
    }
}

/// XPath matching any element whose resource id equals `value`
#[must_use]
pub fn resource_id_xpath(value: &str) -> String {
    format!("//*[@{RESOURCE_ID_ATTRIBUTE}={}]", xpath_literal(value))
}

/// Quote a string as an XPath 1.0 literal
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value.split('\'').map(|part| format!("'{part}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Render candidates as `"strategy": "selector"` pairs
#[must_use]
pub fn describe_candidates(candidates: &[StrategyCandidate]) -> String {
    candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
