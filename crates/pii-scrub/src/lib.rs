//! # pii-scrub
//!
//! Redacts personally identifiable information from a text field of a
//! record batch before it is staged.
//!
//! The crate is organised around four layers:
//!
//! 1. **[`patterns`]** -- static catalogue of phone and email regexes.
//! 2. **[`filter`]** -- compiles the catalogue and masks matches in order.
//! 3. **[`dlp`]** -- the [`Deidentifier`] seam and the Cloud DLP client.
//! 4. **[`scrub`]** -- [`Scrubber`], which runs DLP then the regex filter
//!    over every non-empty value, pacing itself by [`pacing`].
//!
//! ## Quick start
//!
//! ```rust
//! use pii_scrub::regex_filter;
//!
//! assert_eq!(
//!     regex_filter("call 412-555-1234 or a@b.com"),
//!     "call ######### or ####"
//! );
//! ```

pub mod dlp;
pub mod filter;
pub mod pacing;
pub mod patterns;
pub mod scrub;

pub use dlp::{
    CharacterMask, DeidentifyRequest, Deidentifier, DlpClient, DlpError, InfoType,
    DEFAULT_DLP_ENDPOINT, INFO_TYPES,
};
pub use filter::{regex_filter, FilterError, RegexFilter};
pub use pacing::{PacingBasis, PacingPolicy, Sleeper, ThreadSleeper};
pub use patterns::{PatternKind, PiiPattern, PATTERNS};
pub use scrub::{Record, ScrubError, Scrubber};
