//! Tapline CLI Library
//!
//! Offline diagnostics for the Tapline engine: expand locators into their
//! lookup strategies, preview swipe geometry, and print the effective
//! engine configuration.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;

pub use commands::{
    Cli, Commands, ConfigArgs, LocatorArgs, OutputFormat, ResolveArgs, SwipePlanArgs,
};
pub use config::Verbosity;
pub use error::{CliError, CliResult};
