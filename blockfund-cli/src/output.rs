//! Output abstraction for testable printing

use std::str::FromStr;

use crate::error::{CliError, CliResult};

/// Output format selected with `--format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Table,
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            other => Err(CliError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Output abstraction for printing results
pub trait Output: Send + Sync {
    /// Print normal output
    fn print(&self, msg: &str) -> CliResult<()>;

    /// Print formatted JSON
    fn print_json(&self, data: &serde_json::Value) -> CliResult<()> {
        self.print(&serde_json::to_string_pretty(data)?)
    }

    /// Print error message
    fn error(&self, msg: &str) -> CliResult<()>;

    /// Print a section header
    fn header(&self, title: &str) -> CliResult<()> {
        self.print(&format!("\n{}\n{}", title, "=".repeat(title.len())))
    }
}

/// Standard console output implementation
pub struct ConsoleOutput;

impl Output for ConsoleOutput {
    fn print(&self, msg: &str) -> CliResult<()> {
        println!("{}", msg);
        Ok(())
    }

    fn error(&self, msg: &str) -> CliResult<()> {
        eprintln!("error: {}", msg);
        Ok(())
    }
}

pub mod testing {
    use super::*;
    use std::sync::{Arc, Mutex, PoisonError};

    /// Mock output for testing - captures all output
    #[derive(Default)]
    pub struct MockOutput {
        messages: Arc<Mutex<Vec<String>>>,
        errors: Arc<Mutex<Vec<String>>>,
    }

    impl MockOutput {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get_messages(&self) -> Vec<String> {
            self.messages.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        pub fn get_errors(&self) -> Vec<String> {
            self.errors.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        /// Everything printed, joined with newlines
        pub fn text(&self) -> String {
            self.get_messages().join("\n")
        }

        pub fn assert_contains_message(&self, substring: &str) {
            let messages = self.get_messages();
            assert!(
                messages.iter().any(|m| m.contains(substring)),
                "Expected message containing '{}', but got: {:?}",
                substring,
                messages
            );
        }

        pub fn assert_contains_error(&self, substring: &str) {
            let errors = self.get_errors();
            assert!(
                errors.iter().any(|e| e.contains(substring)),
                "Expected error containing '{}', but got: {:?}",
                substring,
                errors
            );
        }
    }

    impl Output for MockOutput {
        fn print(&self, msg: &str) -> CliResult<()> {
            self.messages.lock().unwrap_or_else(PoisonError::into_inner).push(msg.to_string());
            Ok(())
        }

        fn error(&self, msg: &str) -> CliResult<()> {
            self.errors.lock().unwrap_or_else(PoisonError::into_inner).push(msg.to_string());
            Ok(())
        }
    }
}
