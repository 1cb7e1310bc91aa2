//! Batch redaction of one text field across a record batch.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::dlp::{DeidentifyRequest, Deidentifier, DlpError};
use crate::filter::RegexFilter;
use crate::pacing::{PacingPolicy, Sleeper, ThreadSleeper};

/// A schema-on-read row.
pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ScrubError {
    /// The DLP call failed. The batch stops at the failing record; records
    /// before it have already been rewritten.
    #[error(transparent)]
    Remote(#[from] DlpError),
}

/// DLP redaction followed by the regex safety net, with quota pacing.
pub struct Scrubber<D, S = ThreadSleeper> {
    dlp: D,
    filter: RegexFilter,
    pacing: PacingPolicy,
    sleeper: S,
}

impl<D: Deidentifier> Scrubber<D> {
    /// A scrubber with the default 600-per-61s pacing and a blocking sleep.
    pub fn new(dlp: D) -> Self {
        Self {
            dlp,
            filter: RegexFilter::default(),
            pacing: PacingPolicy::default(),
            sleeper: ThreadSleeper,
        }
    }
}

impl<D: Deidentifier, S: Sleeper> Scrubber<D, S> {
    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Scrubber<D, T> {
        Scrubber {
            dlp: self.dlp,
            filter: self.filter,
            pacing: self.pacing,
            sleeper,
        }
    }

    pub fn pacing(&self) -> PacingPolicy {
        self.pacing
    }

    /// Redact `field` in every record, in place, and hand the same slice
    /// back.
    ///
    /// Values that are empty after trimming, missing, or not strings are
    /// left alone and never sent to DLP. Pacing follows the configured
    /// [`PacingPolicy`]. The first DLP error aborts the batch.
    pub fn scrub_pii<'a>(
        &self,
        field: &str,
        records: &'a mut [Record],
    ) -> Result<&'a mut [Record], ScrubError> {
        let mut pacer = self.pacing.pacer();
        let mut redacted = 0usize;

        for (position, record) in records.iter_mut().enumerate() {
            let called = match record.get_mut(field) {
                Some(Value::String(value)) if !value.trim().is_empty() => {
                    *value = self.get_dlp_redaction(value)?;
                    redacted += 1;
                    true
                }
                _ => false,
            };

            if let Some(pause) = pacer.after_record(position, called) {
                info!(
                    position,
                    pause_secs = pause.as_secs(),
                    "pausing for the DLP rate limit"
                );
                self.sleeper.sleep(pause);
            }
        }

        info!(field, total = records.len(), redacted, "scrubbed PII");
        Ok(records)
    }

    /// Consuming form of [`scrub_pii`](Self::scrub_pii).
    pub fn scrubbed(&self, field: &str, mut records: Vec<Record>) -> Result<Vec<Record>, ScrubError> {
        self.scrub_pii(field, &mut records)?;
        Ok(records)
    }

    /// Redact one non-empty value: newlines become spaces, DLP masks the
    /// configured info types, then [`RegexFilter`] masks what DLP missed.
    pub fn get_dlp_redaction(&self, text: &str) -> Result<String, ScrubError> {
        let flattened = text.replace('\n', " ");
        let masked = self
            .dlp
            .deidentify(&DeidentifyRequest::masked(&flattened))?;
        debug!(len = masked.len(), "DLP redaction returned");
        Ok(self.filter.apply(&masked))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::dlp::{CharacterMask, InfoType, INFO_TYPES};
    use crate::pacing::PacingBasis;

    // -- fakes --------------------------------------------------------------

    /// Masks the words in `names` with `#` and records every value it sees.
    #[derive(Default)]
    struct FakeDlp {
        names: Vec<&'static str>,
        seen: RefCell<Vec<String>>,
        fail_on: Option<usize>,
    }

    impl Deidentifier for FakeDlp {
        fn deidentify(&self, request: &DeidentifyRequest<'_>) -> Result<String, DlpError> {
            assert_eq!(request.info_types, INFO_TYPES);
            assert_eq!(request.mask, CharacterMask::default());
            let mut seen = self.seen.borrow_mut();
            if self.fail_on == Some(seen.len()) {
                return Err(DlpError::Status {
                    status: 429,
                    body: "Quota exceeded".to_string(),
                });
            }
            seen.push(request.value.to_string());
            let mut value = request.value.to_string();
            for name in &self.names {
                value = value.replace(name, &"#".repeat(name.len()));
            }
            Ok(value)
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        calls: Cell<usize>,
        total: Cell<Duration>,
    }

    impl Sleeper for &RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.calls.set(self.calls.get() + 1);
            self.total.set(self.total.get() + duration);
        }
    }

    fn comments(values: &[&str]) -> Vec<Record> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| json!({"_id": i, "comments": v}).as_object().cloned().unwrap())
            .collect()
    }

    // -- redaction ----------------------------------------------------------

    #[test]
    fn redacts_names_and_regex_shapes() {
        let dlp = FakeDlp {
            names: vec!["Jane"],
            ..FakeDlp::default()
        };
        let sleeper = RecordingSleeper::default();
        let scrubber = Scrubber::new(&dlp).with_sleeper(&sleeper);
        let mut records = comments(&["Jane said call 412-555-1234 or jane@x.org"]);

        scrubber.scrub_pii("comments", &mut records).unwrap();

        assert_eq!(records[0]["comments"], "#### said call ######### or ####");
        assert_eq!(records[0]["_id"], 0);
    }

    #[test]
    fn newlines_are_flattened_before_dlp() {
        let dlp = FakeDlp::default();
        let scrubber = Scrubber::new(&dlp);
        let out = scrubber.get_dlp_redaction("line one\nline two\n").unwrap();
        assert_eq!(out, "line one line two ");
        assert_eq!(dlp.seen.borrow().as_slice(), ["line one line two "]);
    }

    #[test]
    fn empty_and_whitespace_values_skip_dlp() {
        let dlp = FakeDlp::default();
        let sleeper = RecordingSleeper::default();
        let scrubber = Scrubber::new(&dlp).with_sleeper(&sleeper);
        let mut records = comments(&["", "   ", " \t ", "barking dog"]);

        scrubber.scrub_pii("comments", &mut records).unwrap();

        assert_eq!(records[0]["comments"], "");
        assert_eq!(records[1]["comments"], "   ");
        assert_eq!(records[2]["comments"], " \t ");
        assert_eq!(dlp.seen.borrow().as_slice(), ["barking dog"]);
    }

    #[test]
    fn missing_and_non_string_values_are_tolerated() {
        let dlp = FakeDlp::default();
        let scrubber = Scrubber::new(&dlp);
        let mut records: Vec<Record> = vec![
            json!({"_id": 1}).as_object().cloned().unwrap(),
            json!({"_id": 2, "comments": null}).as_object().cloned().unwrap(),
            json!({"_id": 3, "comments": 15213}).as_object().cloned().unwrap(),
        ];
        scrubber.scrub_pii("comments", &mut records).unwrap();
        assert!(dlp.seen.borrow().is_empty());
        assert_eq!(records[2]["comments"], 15213);
    }

    #[test]
    fn scrub_returns_the_same_slice() {
        let dlp = FakeDlp::default();
        let scrubber = Scrubber::new(&dlp);
        let mut records = comments(&["a"]);
        let ptr = records.as_ptr();
        let out = scrubber.scrub_pii("comments", &mut records).unwrap();
        assert_eq!(out.as_ptr(), ptr);
    }

    #[test]
    fn scrubbed_consumes_and_returns_records() {
        let dlp = FakeDlp {
            names: vec!["Bob"],
            ..FakeDlp::default()
        };
        let scrubber = Scrubber::new(&dlp);
        let out = scrubber.scrubbed("comments", comments(&["Bob"])).unwrap();
        assert_eq!(out[0]["comments"], "###");
    }

    // -- failure ------------------------------------------------------------

    #[test]
    fn dlp_error_aborts_batch() {
        let dlp = FakeDlp {
            fail_on: Some(1),
            ..FakeDlp::default()
        };
        let scrubber = Scrubber::new(&dlp);
        let mut records = comments(&["Jane 555-1234", "second", "third"]);

        let err = scrubber.scrub_pii("comments", &mut records).unwrap_err();

        assert!(matches!(
            err,
            ScrubError::Remote(DlpError::Status { status: 429, .. })
        ));
        // Records before the failure were already rewritten in place.
        assert_eq!(records[0]["comments"], "Jane #########");
        assert_eq!(records[1]["comments"], "second");
        assert_eq!(records[2]["comments"], "third");
    }

    // -- pacing -------------------------------------------------------------

    #[test]
    fn pauses_twice_over_1300_records() {
        let dlp = FakeDlp::default();
        let sleeper = RecordingSleeper::default();
        let scrubber = Scrubber::new(&dlp).with_sleeper(&sleeper);
        let values: Vec<String> = (0..1300).map(|i| format!("note {i}")).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let mut records = comments(&refs);

        scrubber.scrub_pii("comments", &mut records).unwrap();

        assert_eq!(sleeper.calls.get(), 2);
        assert_eq!(sleeper.total.get(), Duration::from_secs(122));
        assert_eq!(dlp.seen.borrow().len(), 1300);
    }

    #[test]
    fn pause_follows_record_at_index_600() {
        let dlp = FakeDlp::default();
        let sleeper = RecordingSleeper::default();
        let scrubber = Scrubber::new(&dlp).with_sleeper(&sleeper);
        let values: Vec<String> = (0..601).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();

        let mut first_600 = comments(&refs[..600]);
        scrubber.scrub_pii("comments", &mut first_600).unwrap();
        assert_eq!(sleeper.calls.get(), 0);

        let mut all_601 = comments(&refs);
        scrubber.scrub_pii("comments", &mut all_601).unwrap();
        assert_eq!(sleeper.calls.get(), 1);
    }

    #[test]
    fn empty_records_count_toward_position_pacing() {
        let dlp = FakeDlp::default();
        let sleeper = RecordingSleeper::default();
        let scrubber = Scrubber::new(&dlp).with_sleeper(&sleeper);
        let mut records = comments(&vec![""; 1201]);

        scrubber.scrub_pii("comments", &mut records).unwrap();

        assert!(dlp.seen.borrow().is_empty());
        assert_eq!(sleeper.calls.get(), 2);
    }

    #[test]
    fn remote_call_pacing_skips_empty_records() {
        let dlp = FakeDlp::default();
        let sleeper = RecordingSleeper::default();
        let scrubber = Scrubber::new(&dlp)
            .with_sleeper(&sleeper)
            .with_pacing(PacingPolicy {
                basis: PacingBasis::RemoteCalls,
                ..PacingPolicy::default()
            });
        let mut records = comments(&vec![""; 1201]);

        scrubber.scrub_pii("comments", &mut records).unwrap();

        assert_eq!(sleeper.calls.get(), 0);
    }

    #[test]
    fn pacing_survives_sleeper_swap() {
        let dlp = FakeDlp::default();
        assert_eq!(Scrubber::new(&dlp).pacing(), PacingPolicy::default());

        let policy = PacingPolicy {
            calls_per_window: 300,
            basis: PacingBasis::RemoteCalls,
            ..PacingPolicy::default()
        };
        let sleeper = RecordingSleeper::default();
        let scrubber = Scrubber::new(&dlp).with_pacing(policy).with_sleeper(&sleeper);
        assert_eq!(scrubber.pacing(), policy);
    }

    #[test]
    fn info_type_taxonomy_is_fixed() {
        assert_eq!(
            INFO_TYPES,
            &[
                InfoType::EmailAddress,
                InfoType::FirstName,
                InfoType::LastName,
                InfoType::PhoneNumber,
                InfoType::Url,
                InfoType::StreetAddress,
            ]
        );
    }
}
