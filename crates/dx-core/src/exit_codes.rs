//! Exit codes for the dx CLI.
//!
//! Exit codes communicate the outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/input errors (fixable by changing arguments or files)
//! - 20-29: Internal errors (bugs or the environment)

use dx_common::{Error, ErrorCategory};

/// Exit codes for dx operations.
///
/// These codes are a stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Clean = 0,

    // ========================================================================
    // User / Input Errors (10-19)
    // ========================================================================
    /// Invalid command-line arguments
    ArgsError = 10,

    /// Network file missing, unparsable, or semantically invalid
    ConfigError = 11,

    /// Network structure rejected (ordering, CPT shape)
    NetworkError = 12,

    /// Query names an unknown variable, bad label, or assigns the query
    QueryError = 13,

    /// Evidence has probability zero under the network
    DegenerateEvidence = 14,

    /// Too many hidden variables for exact enumeration
    TooExpensive = 15,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == ExitCode::Clean
    }

    /// User/input error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::NetworkError => "ERR_NETWORK",
            ExitCode::QueryError => "ERR_QUERY",
            ExitCode::DegenerateEvidence => "ERR_DEGENERATE_EVIDENCE",
            ExitCode::TooExpensive => "ERR_TOO_EXPENSIVE",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }

    /// Exit code for a unified error.
    pub fn for_error(err: &Error) -> Self {
        match err {
            Error::DegenerateEvidence(_) => ExitCode::DegenerateEvidence,
            Error::QueryTooExpensive { .. } => ExitCode::TooExpensive,
            Error::Json(_) => ExitCode::InternalError,
            _ => match err.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Network => ExitCode::NetworkError,
                ErrorCategory::Inference | ErrorCategory::Diagnosis => ExitCode::QueryError,
                ErrorCategory::Io => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
