//! Regex safety-net catalogue.
//!
//! Each entry pairs a regex with the fixed token that replaces its matches.
//! Entries are applied in catalogue order by
//! [`RegexFilter`](crate::filter::RegexFilter), so phone numbers are masked
//! before email addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The PII shape a pattern targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternKind {
    Phone,
    Email,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Phone => write!(f, "Phone"),
            Self::Email => write!(f, "Email"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pattern definition
// ---------------------------------------------------------------------------

/// A single safety-net pattern.
pub struct PiiPattern {
    /// Short, snake_case identifier used in logs.
    pub name: &'static str,
    pub kind: PatternKind,
    /// A regex string, compiled by [`crate::filter::RegexFilter::new`].
    pub pattern: &'static str,
    /// Literal text substituted for every match.
    pub replacement: &'static str,
}

// ---------------------------------------------------------------------------
// Pattern catalogue
// ---------------------------------------------------------------------------

/// The built-in safety-net patterns, in application order.
///
/// The phone pattern is greedy: it also hits ID numbers shaped like
/// `123-4567`. Review a field before running it through the filter if it
/// carries numeric identifiers.
pub static PATTERNS: &[PiiPattern] = &[
    // 412-555-1234, 412.555.1234, (412)555-1234, 555-1234
    PiiPattern {
        name: "phone",
        kind: PatternKind::Phone,
        pattern: r"(\d{3}[-\.]\d{3}[-\.]\d{4}|\(\d{3}\)*\d{3}[-\.]\d{4}|\d{3}[-\.]\d{4})",
        replacement: "#########",
    },
    PiiPattern {
        name: "email",
        kind: PatternKind::Email,
        pattern: r"\S+@\S+",
        replacement: "####",
    },
];
