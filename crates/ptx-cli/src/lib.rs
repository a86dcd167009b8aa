//! ptx - CLI for private transaction envelopes
//!
//! This crate provides a command-line interface for:
//! - Sealing a transaction into a `private_v1` envelope
//! - Opening an envelope with the committee group key
//! - Fingerprinting a group key without revealing it
//! - Inspecting an envelope without any key

pub mod cli;
pub mod config;
pub mod inspect;
pub mod output;
pub mod public;

pub use cli::Cli;
pub use config::{CliOverrides, Config};
pub use output::{JsonResponse, OutputFormat, OutputFormatter};

/// Exit codes for CLI operations
///
/// - 0: Success
/// - 1: General error (I/O, config, internal failures)
/// - 2: Authentication failed (envelope did not open under the given key)
/// - 5: Invalid input (bad key encoding, malformed transaction or envelope)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully (exit code 0)
    Success = 0,
    /// General error (exit code 1)
    GeneralError = 1,
    /// Authentication failed (exit code 2)
    AuthenticationFailed = 2,
    /// Invalid input provided (exit code 5)
    InvalidInput = 5,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Convert to process exit code
    pub fn to_exit_code(self) -> std::process::ExitCode {
        std::process::ExitCode::from(self as u8)
    }

    /// Get the exit code name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ExitCode::Success => "SUCCESS",
            ExitCode::GeneralError => "GENERAL_ERROR",
            ExitCode::AuthenticationFailed => "AUTH_FAILED",
            ExitCode::InvalidInput => "INVALID_INPUT",
        }
    }

    /// Get a human-readable description of the exit code
    pub fn description(&self) -> &'static str {
        match self {
            ExitCode::Success => "Operation completed successfully",
            ExitCode::GeneralError => "An unspecified error occurred",
            ExitCode::AuthenticationFailed => "Envelope authentication failed",
            ExitCode::InvalidInput => "Invalid arguments or data provided",
        }
    }
}
