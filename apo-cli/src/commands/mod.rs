//! One-shot subcommands that run outside the dashboard.

mod ask;
mod config;

pub use ask::run_ask;
pub use config::run_config;
