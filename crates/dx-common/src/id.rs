//! Run identifiers.
//!
//! Every CLI invocation gets a run ID that appears in its JSON payload and in
//! every log line, so a result can be matched with the logs that produced it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

const PREFIX: &str = "dx-";
const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
const SUFFIX_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";
const SUFFIX_LEN: usize = 4;

/// Run ID for one CLI invocation: `dx-YYYYMMDD-HHMMSS-xxxx`, e.g.
/// `dx-20260115-143022-a7xq`. The suffix is four base32 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new run ID stamped with the current UTC time.
    pub fn new() -> Self {
        let stamp = chrono::Utc::now().format(STAMP_FORMAT);
        RunId(format!("{}{}-{}", PREFIX, stamp, random_suffix()))
    }

    /// Parse an existing run ID; `None` unless the timestamp is a real
    /// date and time and the suffix is lowercase base32.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix(PREFIX)?;
        let (stamp, suffix) = rest.rsplit_once('-')?;
        if stamp.len() != 15 || suffix.len() != SUFFIX_LEN {
            return None;
        }
        NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT).ok()?;
        if !suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b)) {
            return None;
        }
        Some(RunId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Four base32 characters from the low bits of a random UUID.
fn random_suffix() -> String {
    let mut bits = uuid::Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        out.push(SUFFIX_ALPHABET[(bits & 0x1F) as usize] as char);
        bits >>= 5;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_format() {
        let rid = RunId::new();
        assert!(rid.as_str().starts_with("dx-"));
        assert_eq!(rid.as_str().len(), 23);
    }

    #[test]
    fn test_run_id_parse_roundtrip() {
        let rid = RunId::new();
        assert_eq!(RunId::parse(rid.as_str()), Some(rid));
    }

    #[test]
    fn test_run_id_parse_rejects_garbage() {
        assert!(RunId::parse("dx-20260115-143022-a7xq").is_some());
        assert!(RunId::parse("run-20260115-143022-a7xq").is_none());
        assert!(RunId::parse("dx-2026011x-143022-a7xq").is_none());
        assert!(RunId::parse("dx-20261315-143022-a7xq").is_none());
        assert!(RunId::parse("dx-20260115-143022-A7XQ").is_none());
        assert!(RunId::parse("dx-short").is_none());
    }
}
