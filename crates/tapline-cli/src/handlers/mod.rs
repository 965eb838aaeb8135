//! Command handlers - extracted from main.rs for testability
//!
//! Each handler returns the rendered output as a `String`; `main` prints it.

pub mod config;
pub mod resolve;
pub mod swipe_plan;

pub use config::execute_config;
pub use resolve::execute_resolve;
pub use swipe_plan::execute_swipe_plan;
