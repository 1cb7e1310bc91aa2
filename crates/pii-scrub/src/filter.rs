//! Deterministic phone/email masking applied after DLP de-identification.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::patterns::{PiiPattern, PATTERNS};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while constructing a [`RegexFilter`].
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("failed to compile regex pattern: {0}")]
    RegexCompile(#[from] regex::Error),
}

// ---------------------------------------------------------------------------
// RegexFilter
// ---------------------------------------------------------------------------

/// The compiled [`PATTERNS`] catalogue.
pub struct RegexFilter {
    /// Same order as [`PATTERNS`].
    compiled: Vec<(&'static PiiPattern, Regex)>,
}

impl RegexFilter {
    /// Compile every pattern in the catalogue.
    pub fn new() -> Result<Self, FilterError> {
        let compiled = PATTERNS
            .iter()
            .map(|p| Regex::new(p.pattern).map(|re| (p, re)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { compiled })
    }

    /// Replace every match of each pattern with its token.
    ///
    /// Patterns run one after another on the output of the previous one, so
    /// the email pass sees text the phone pass has already masked.
    pub fn apply(&self, text: &str) -> String {
        let mut value = text.to_string();
        for (pattern, re) in &self.compiled {
            let hits = re.find_iter(&value).count();
            if hits == 0 {
                continue;
            }
            debug!(pattern = pattern.name, kind = %pattern.kind, hits, "regex safety net matched");
            value = re.replace_all(&value, pattern.replacement).into_owned();
        }
        value
    }

    pub fn pattern_count(&self) -> usize {
        self.compiled.len()
    }
}

impl Default for RegexFilter {
    /// # Panics
    ///
    /// Panics if the built-in catalogue fails to compile.
    fn default() -> Self {
        Self::new().expect("built-in patterns must compile")
    }
}

static DEFAULT_FILTER: LazyLock<RegexFilter> = LazyLock::new(RegexFilter::default);

/// Mask phone- and email-shaped substrings in `text` with the built-in
/// catalogue.
pub fn regex_filter(text: &str) -> String {
    DEFAULT_FILTER.apply(text)
}
