//! Resolve command handler

use crate::commands::{LocatorArgs, OutputFormat, ResolveArgs};
use crate::error::{CliError, CliResult};
use serde::Serialize;
use tapline::{AbstractLocator, CandidateRank, StrategyCandidate};

/// Locator plus the candidates it expands to
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// Locator in `strategy=selector` form
    pub locator: String,
    /// Ordered lookup candidates
    pub candidates: Vec<StrategyCandidate>,
}

/// Execute the resolve command
pub fn execute_resolve(args: &ResolveArgs) -> CliResult<String> {
    let locator = build_locator(&args.locator, args.selector.as_deref())?;
    locator.validate()?;
    let resolution = Resolution {
        locator: locator.to_string(),
        candidates: locator.resolve(),
    };
    tracing::debug!(
        locator = %resolution.locator,
        candidates = resolution.candidates.len(),
        "Resolved locator"
    );
    render(&resolution, args.format)
}

/// Build the abstract locator from the CLI flags
pub fn build_locator(args: &LocatorArgs, selector: Option<&str>) -> CliResult<AbstractLocator> {
    if let Some(id) = &args.id {
        return Ok(AbstractLocator::by_id(id.as_str()));
    }
    if let Some(xpath) = &args.xpath {
        return Ok(AbstractLocator::by_xpath(xpath.as_str()));
    }
    if let Some(accessibility_id) = &args.accessibility_id {
        return Ok(AbstractLocator::by_accessibility_id(accessibility_id.as_str()));
    }
    match (&args.strategy, selector) {
        (Some(strategy), Some(selector)) => {
            Ok(AbstractLocator::by_raw(strategy.as_str(), selector))
        }
        (Some(_), None) => Err(CliError::invalid_argument("--strategy requires --selector")),
        (None, _) => Err(CliError::invalid_argument(
            "one of --id, --xpath, --accessibility-id or --strategy is required",
        )),
    }
}

/// Render a resolution
pub fn render(resolution: &Resolution, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(resolution)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(resolution)?),
        OutputFormat::Yaml => Ok(serde_yaml_ng::to_string(resolution)?),
    }
}

fn render_text(resolution: &Resolution) -> String {
    let mut out = format!("Locator: {}\n", resolution.locator);
    for (index, candidate) in resolution.candidates.iter().enumerate() {
        let rank = match candidate.rank {
            CandidateRank::Primary => "primary",
            CandidateRank::Fallback => "fallback",
        };
        out.push_str(&format!(
            "  {}. [{rank}] {candidate}\n",
            index + 1
        ));
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn locator_args() -> LocatorArgs {
        LocatorArgs {
            id: None,
            xpath: None,
            accessibility_id: None,
            strategy: None,
        }
    }

    fn args(locator: LocatorArgs, selector: Option<&str>, format: OutputFormat) -> ResolveArgs {
        ResolveArgs {
            locator,
            selector: selector.map(str::to_string),
            format,
        }
    }

    mod build_locator_tests {
        use super::*;

        #[test]
        fn test_id() {
            let locator = build_locator(
                &LocatorArgs {
                    id: Some("com.app:id/ok".into()),
                    ..locator_args()
                },
                None,
            )
            .unwrap();
            assert_eq!(locator, AbstractLocator::by_id("com.app:id/ok"));
        }

        #[test]
        fn test_raw_needs_selector() {
            let err = build_locator(
                &LocatorArgs {
                    strategy: Some("class name".into()),
                    ..locator_args()
                },
                None,
            )
            .unwrap_err();
            assert!(err.to_string().contains("--selector"));
        }

        #[test]
        fn test_raw_with_selector() {
            let locator = build_locator(
                &LocatorArgs {
                    strategy: Some("class name".into()),
                    ..locator_args()
                },
                Some("android.widget.Button"),
            )
            .unwrap();
            assert_eq!(locator.to_string(), "class name=android.widget.Button");
        }

        #[test]
        fn test_nothing_given() {
            assert!(build_locator(&locator_args(), None).is_err());
        }
    }

    mod execute_tests {
        use super::*;

        #[test]
        fn test_text_lists_primary_then_fallback() {
            let out = execute_resolve(&args(
                LocatorArgs {
                    id: Some("com.app:id/login".into()),
                    ..locator_args()
                },
                None,
                OutputFormat::Text,
            ))
            .unwrap();
            let lines: Vec<&str> = out.lines().collect();
            assert_eq!(lines[0], "Locator: id=com.app:id/login");
            assert_eq!(lines[1], "  1. [primary] \"id\": \"com.app:id/login\"");
            assert_eq!(
                lines[2],
                "  2. [fallback] \"xpath\": \"//*[@resource-id='com.app:id/login']\""
            );
        }

        #[test]
        fn test_json_shape() {
            let out = execute_resolve(&args(
                LocatorArgs {
                    accessibility_id: Some("Sign in".into()),
                    ..locator_args()
                },
                None,
                OutputFormat::Json,
            ))
            .unwrap();
            let value: serde_json::Value = serde_json::from_str(&out).unwrap();
            assert_eq!(value["locator"], "accessibility id=Sign in");
            assert_eq!(value["candidates"][0]["strategy"], "accessibility id");
            assert_eq!(value["candidates"][0]["rank"], "primary");
            assert_eq!(value["candidates"].as_array().unwrap().len(), 1);
        }

        #[test]
        fn test_yaml_output() {
            let out = execute_resolve(&args(
                LocatorArgs {
                    xpath: Some("//android.widget.Button".into()),
                    ..locator_args()
                },
                None,
                OutputFormat::Yaml,
            ))
            .unwrap();
            assert!(out.contains("strategy: xpath"));
        }

        #[test]
        fn test_empty_value_is_unsupported() {
            let err = execute_resolve(&args(
                LocatorArgs {
                    id: Some("  ".into()),
                    ..locator_args()
                },
                None,
                OutputFormat::Text,
            ))
            .unwrap_err();
            assert!(matches!(err, CliError::Tapline(_)));
            assert!(err.to_string().contains("Unsupported locator"));
        }
    }
}
