//! Config command handler

use crate::commands::{ConfigArgs, OutputFormat};
use crate::error::{CliError, CliResult};
use tapline::EngineConfig;

/// Execute the config command against the process environment
pub fn execute_config(args: &ConfigArgs) -> CliResult<String> {
    execute_config_with(args, |key| std::env::var(key).ok())
}

/// Execute the config command with an explicit environment lookup
pub fn execute_config_with<F>(args: &ConfigArgs, lookup: F) -> CliResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let config = load_config(args, lookup)?;
    render(&config, args.format)
}

/// File (or defaults), then environment overrides, then validation
pub fn load_config<F>(args: &ConfigArgs, lookup: F) -> CliResult<EngineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match &args.file {
        Some(path) if !path.is_file() => {
            return Err(CliError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    Ok(base.apply_env_with(lookup)?)
}

/// Render the effective configuration
pub fn render(config: &EngineConfig, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(config)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
        OutputFormat::Yaml => Ok(config.to_yaml()?),
    }
}

fn render_text(config: &EngineConfig) -> String {
    format!(
        concat!(
            "Engine configuration:\n",
            "  Platform: {}\n",
            "  Default timeout: {}ms\n",
            "  Poll interval: {}ms\n",
            "  Presence check timeout: {}ms\n",
            "  Retry: {} attempts, {}ms pause\n",
            "  Swipe: distance {}, {}ms, settle {}ms\n",
        ),
        config.platform,
        config.default_timeout_ms,
        config.poll_interval_ms,
        config.presence_check_timeout_ms,
        config.retry.max_attempts,
        config.retry.pause_ms,
        config.swipe.distance,
        config.swipe.duration_ms,
        config.swipe.settle_ms,
    )
}
