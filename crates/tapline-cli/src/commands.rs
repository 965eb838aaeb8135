//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tapline::{Direction, Platform};

/// Tapline: element resolution and interaction diagnostics for mobile UI tests
#[derive(Parser, Debug)]
#[command(name = "tapline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expand a locator into its ordered lookup strategies
    Resolve(ResolveArgs),

    /// Compute swipe geometry and the payloads sent to the driver
    SwipePlan(SwipePlanArgs),

    /// Show the effective engine configuration
    Config(ConfigArgs),
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
    /// YAML
    Yaml,
}

/// Exactly one locator kind
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct LocatorArgs {
    /// Resource id (Android) or name/identifier (iOS)
    #[arg(long)]
    pub id: Option<String>,

    /// XPath expression
    #[arg(long)]
    pub xpath: Option<String>,

    /// Accessibility id / content description
    #[arg(long)]
    pub accessibility_id: Option<String>,

    /// Raw strategy name, used with --selector
    #[arg(long, allow_hyphen_values = true)]
    pub strategy: Option<String>,
}

/// Arguments for `resolve`
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Locator to expand
    #[command(flatten)]
    pub locator: LocatorArgs,

    /// Selector for --strategy
    #[arg(long, allow_hyphen_values = true)]
    pub selector: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for `swipe-plan`
#[derive(Args, Debug, Clone)]
pub struct SwipePlanArgs {
    /// Viewport width in pixels
    #[arg(long)]
    pub width: u32,

    /// Viewport height in pixels
    #[arg(long)]
    pub height: u32,

    /// Finger travel direction (up, down, left, right)
    #[arg(short, long, value_parser = parse_direction)]
    pub direction: Direction,

    /// Target platform (android, ios)
    #[arg(short, long, value_parser = parse_platform, default_value = "android")]
    pub platform: Platform,

    /// Travel as a fraction of the screen, in (0, 0.8]
    #[arg(long)]
    pub distance: Option<f64>,

    /// Gesture duration in milliseconds
    #[arg(long)]
    pub duration_ms: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,
}

/// Arguments for `config`
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// YAML config file; defaults apply when omitted
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

fn parse_direction(value: &str) -> Result<Direction, String> {
    value.parse().map_err(|e: tapline::TaplineError| e.to_string())
}

fn parse_platform(value: &str) -> Result<Platform, String> {
    value.parse().map_err(|e: tapline::TaplineError| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    mod resolve_tests {
        use super::*;

        #[test]
        fn test_parse_id() {
            let cli = Cli::parse_from(["tapline", "resolve", "--id", "com.app:id/login"]);
            let Commands::Resolve(args) = cli.command else {
                panic!("expected resolve");
            };
            assert_eq!(args.locator.id.as_deref(), Some("com.app:id/login"));
            assert_eq!(args.format, OutputFormat::Text);
        }

        #[test]
        fn test_requires_a_locator() {
            assert!(Cli::try_parse_from(["tapline", "resolve"]).is_err());
        }

        #[test]
        fn test_rejects_two_locators() {
            let result =
                Cli::try_parse_from(["tapline", "resolve", "--id", "a", "--xpath", "//b"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_parse_raw_strategy() {
            let cli = Cli::parse_from([
                "tapline",
                "resolve",
                "--strategy",
                "-android uiautomator",
                "--selector",
                "new UiSelector().text(\"OK\")",
                "--format",
                "json",
            ]);
            let Commands::Resolve(args) = cli.command else {
                panic!("expected resolve");
            };
            assert_eq!(args.locator.strategy.as_deref(), Some("-android uiautomator"));
            assert_eq!(args.format, OutputFormat::Json);
        }

        #[test]
        fn test_hyphenated_selector() {
            let cli = Cli::parse_from([
                "tapline",
                "resolve",
                "--strategy",
                "-ios class chain",
                "--selector",
                "-**/XCUIElementTypeButton",
            ]);
            let Commands::Resolve(args) = cli.command else {
                panic!("expected resolve");
            };
            assert_eq!(args.locator.strategy.as_deref(), Some("-ios class chain"));
            assert_eq!(args.selector.as_deref(), Some("-**/XCUIElementTypeButton"));
        }
    }

    mod swipe_plan_tests {
        use super::*;

        #[test]
        fn test_parse_swipe_plan() {
            let cli = Cli::parse_from([
                "tapline",
                "swipe-plan",
                "--width",
                "1080",
                "--height",
                "1920",
                "--direction",
                "UP",
                "--platform",
                "ios",
            ]);
            let Commands::SwipePlan(args) = cli.command else {
                panic!("expected swipe-plan");
            };
            assert_eq!(args.direction, Direction::Up);
            assert_eq!(args.platform, Platform::Ios);
            assert_eq!(args.format, OutputFormat::Json);
            assert!(args.distance.is_none());
        }

        #[test]
        fn test_rejects_unknown_direction() {
            let result = Cli::try_parse_from([
                "tapline",
                "swipe-plan",
                "--width",
                "10",
                "--height",
                "10",
                "--direction",
                "sideways",
            ]);
            assert!(result.is_err());
        }
    }

    mod global_flag_tests {
        use super::*;

        #[test]
        fn test_verbose_count_after_subcommand() {
            let cli = Cli::parse_from(["tapline", "config", "-vv", "--log-json"]);
            assert_eq!(cli.verbose, 2);
            assert!(cli.log_json);
        }
    }
}
