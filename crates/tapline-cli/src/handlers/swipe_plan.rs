//! Swipe-plan command handler

use crate::commands::{OutputFormat, SwipePlanArgs};
use crate::error::{CliError, CliResult};
use serde::Serialize;
use tapline::gesture::VENDOR_SWIPE;
use tapline::{EngineConfig, Platform, PointerSequence, SwipeConfig, SwipePlan, WindowSize};

/// Vendor command the engine tries first
#[derive(Debug, Clone, Serialize)]
pub struct VendorCommand {
    /// Command name
    pub command: &'static str,
    /// Command arguments
    pub params: serde_json::Value,
}

/// Everything the engine would send for one swipe
#[derive(Debug, Clone, Serialize)]
pub struct SwipeReport {
    /// Target platform
    pub platform: Platform,
    /// Viewport
    pub window: WindowSize,
    /// Computed geometry
    pub plan: SwipePlan,
    /// First mechanism
    pub vendor: VendorCommand,
    /// Pointer-action fallback
    pub pointer_fallback: PointerSequence,
}

/// Execute the swipe-plan command
pub fn execute_swipe_plan(args: &SwipePlanArgs) -> CliResult<String> {
    let report = build_report(args)?;
    tracing::debug!(
        direction = %report.plan.direction,
        platform = %report.platform,
        "Computed swipe plan"
    );
    render(&report, args.format)
}

/// Validate the arguments and compute the report
pub fn build_report(args: &SwipePlanArgs) -> CliResult<SwipeReport> {
    if args.width == 0 || args.height == 0 {
        return Err(CliError::invalid_argument(format!(
            "window size must be positive, got {}x{}",
            args.width, args.height
        )));
    }

    let defaults = SwipeConfig::default();
    let swipe = SwipeConfig {
        distance: args.distance.unwrap_or(defaults.distance),
        duration_ms: args.duration_ms.unwrap_or(defaults.duration_ms),
        ..defaults
    };
    let config = EngineConfig::default()
        .with_platform(args.platform)
        .with_swipe(swipe);
    config.validate()?;

    let window = WindowSize::new(args.width, args.height);
    let plan = SwipePlan::compute(window, args.direction, swipe.distance, swipe.duration_ms);
    Ok(SwipeReport {
        platform: args.platform,
        window,
        plan,
        vendor: VendorCommand {
            command: VENDOR_SWIPE,
            params: plan.vendor_params(args.platform),
        },
        pointer_fallback: plan.pointer_sequence(),
    })
}

/// Render a swipe report
pub fn render(report: &SwipeReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => render_text(report),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Yaml => Ok(serde_yaml_ng::to_string(report)?),
    }
}

fn render_text(report: &SwipeReport) -> CliResult<String> {
    let plan = &report.plan;
    Ok(format!(
        concat!(
            "Swipe {} on {} ({}x{})\n",
            "  start: ({:.0}, {:.0})\n",
            "  end:   ({:.0}, {:.0})\n",
            "  duration: {}ms\n",
            "  vendor: {} {}\n",
            "  fallback: pointer actions ({} steps)\n",
        ),
        plan.direction,
        report.platform,
        report.window.width,
        report.window.height,
        plan.start.x,
        plan.start.y,
        plan.end.x,
        plan.end.y,
        plan.duration_ms,
        report.vendor.command,
        serde_json::to_string(&report.vendor.params)?,
        report.pointer_fallback.actions.len(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tapline::Direction;

    fn args(direction: Direction, platform: Platform) -> SwipePlanArgs {
        SwipePlanArgs {
            width: 1080,
            height: 1920,
            direction,
            platform,
            distance: None,
            duration_ms: None,
            format: OutputFormat::Json,
        }
    }

    #[test]
    fn test_android_vendor_params() {
        let report = build_report(&args(Direction::Up, Platform::Android)).unwrap();
        assert_eq!(report.vendor.command, "mobile: swipe");
        assert_eq!(report.vendor.params["startX"], 540);
        assert_eq!(report.vendor.params["startY"], 1536);
        assert_eq!(report.vendor.params["endY"], 576);
        assert_eq!(report.vendor.params["duration"], 300);
    }

    #[test]
    fn test_ios_vendor_params() {
        let report = build_report(&args(Direction::Left, Platform::Ios)).unwrap();
        assert_eq!(report.vendor.params, serde_json::json!({"direction": "left"}));
    }

    #[test]
    fn test_pointer_fallback_is_a_drag() {
        let report = build_report(&args(Direction::Down, Platform::Android)).unwrap();
        assert!(report.pointer_fallback.is_drag());
    }

    #[test]
    fn test_custom_distance_and_duration() {
        let mut a = args(Direction::Right, Platform::Android);
        a.distance = Some(0.25);
        a.duration_ms = Some(800);
        let report = build_report(&a).unwrap();
        assert_eq!(report.plan.duration_ms, 800);
        assert_eq!(report.vendor.params["startX"], 216);
        assert_eq!(report.vendor.params["endX"], 486);
    }

    #[test]
    fn test_distance_out_of_range() {
        let mut a = args(Direction::Up, Platform::Android);
        a.distance = Some(0.95);
        let err = build_report(&a).unwrap_err();
        assert!(err.to_string().contains("swipe.distance"));
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut a = args(Direction::Up, Platform::Android);
        a.width = 0;
        assert!(matches!(
            build_report(&a).unwrap_err(),
            CliError::InvalidArgument { .. }
        ));
    }

    #[test]
    fn test_json_output_parses() {
        let out = execute_swipe_plan(&args(Direction::Up, Platform::Android)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["plan"]["direction"], "up");
        assert_eq!(value["platform"], "android");
        assert_eq!(value["pointer_fallback"]["type"], "pointer");
    }

    #[test]
    fn test_text_output() {
        let mut a = args(Direction::Up, Platform::Android);
        a.format = OutputFormat::Text;
        let out = execute_swipe_plan(&a).unwrap();
        assert!(out.starts_with("Swipe up on android (1080x1920)"));
        assert!(out.contains("start: (540, 1536)"));
    }
}
