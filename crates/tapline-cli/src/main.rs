//! Tapline CLI: offline diagnostics for the mobile interaction engine
//!
//! ## Usage
//!
//! ```bash
//! tapline resolve --id com.app:id/login           # Show lookup strategies
//! tapline swipe-plan --width 1080 --height 1920 -d up
//! tapline config --file tapline.yaml -f yaml      # Effective engine config
//! ```

use clap::Parser;
use std::process::ExitCode;
use tapline_cli::{handlers, logging, Cli, CliResult, Commands, Verbosity};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    logging::init(verbosity, cli.log_json);

    let output = match cli.command {
        Commands::Resolve(args) => handlers::execute_resolve(&args)?,
        Commands::SwipePlan(args) => handlers::execute_swipe_plan(&args)?,
        Commands::Config(args) => handlers::execute_config(&args)?,
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
