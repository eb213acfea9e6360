//! BlockFund CLI Library
//!
//! Drives a [`lib_funding::FundingEngine`] from a TOML configuration and a
//! JSON command script.
//!
//! ## Architecture
//!
//! - **Functional Core**: pure report builders in `commands/` (`build_report`, `run_script`)
//! - **Imperative Shell**: the `handle_*` functions that load files and render output
//! - **Error Handling** (`error` module): structured, domain-specific error types
//! - **Output Abstraction** (`output` module): testable printing interface

pub mod argument_parsing;
pub mod commands;
pub mod error;
pub mod output;

pub use argument_parsing::{dispatch, run_cli, BlockfundCli, BlockfundCommand, RunArgs};
pub use error::{CliError, CliResult};
pub use output::{Output, OutputFormat};

/// BlockFund CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
