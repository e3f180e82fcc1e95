//! dx common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the dx crates:
//! - Run identity for correlating output with logs
//! - Common error type with stable codes
//! - Output format specifications

pub mod error;
pub mod id;
pub mod output;

pub use error::{
    format_error_human, Error, ErrorCategory, Result, StructuredError, SuggestedAction,
};
pub use id::RunId;
pub use output::OutputFormat;

/// Schema version of JSON payloads written to stdout.
pub const SCHEMA_VERSION: &str = "1.0.0";
