//! Maps a call result onto an idempotent outcome.
//!
//! A non-zero return code is not necessarily a failure: when the message
//! text says the desired state already holds ("Image disk already
//! defined"), re-running the operation is a no-op. Which texts count is
//! decided per API and operation by the [`crate::ErrorCatalog`].

use serde::Serialize;

use crate::{CallResult, Operation};

/// Note appended to the output when a failure was recognized as benign.
pub const SKIP_NOTE: &str = ">> skipping an error because its probably OK in this situation <<";

/// Return and reason code of a report for which SMAPI was never called.
pub const UNSET_CODE: i64 = -9;

/// Diagnostic line reported on stderr for an out-of-range return code.
const UNKNOWN_CODE_NOTE: &str = "return code outside the SMAPI range";

/// Classification of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Outcome {
    /// Return code 0: the operation took effect.
    Changed(CallResult),
    /// Non-zero return code whose text matched a benign substring.
    AlreadySatisfied(CallResult),
    /// Non-zero return code with no benign match.
    Failed(CallResult),
    /// Negative return code: the caller never got a real SMAPI status.
    UnknownReturnCode(CallResult),
}

/// Classifies `result` against the `benign` substrings.
///
/// Matching is a case-sensitive substring search over the whole message
/// text; any single hit is enough. Empty patterns are ignored so a blank
/// catalog entry cannot mask every failure.
pub fn classify<S: AsRef<str>>(result: &CallResult, benign: &[S]) -> Outcome {
    match result.return_code {
        0 => Outcome::Changed(result.clone()),
        rc if rc >= 1 => {
            let hits = benign
                .iter()
                .filter(|s| {
                    let s: &str = (*s).as_ref();
                    !s.is_empty() && result.message_text.contains(s)
                })
                .count();
            if hits > 0 {
                Outcome::AlreadySatisfied(result.clone())
            } else {
                Outcome::Failed(result.clone())
            }
        }
        _ => Outcome::UnknownReturnCode(result.clone()),
    }
}

impl Outcome {
    /// Returns `true` for [`Outcome::Changed`] and [`Outcome::AlreadySatisfied`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Changed(_) | Self::AlreadySatisfied(_))
    }

    /// Returns `true` if the operation modified the system.
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    /// The call result this outcome was derived from.
    pub fn result(&self) -> &CallResult {
        match self {
            Self::Changed(r)
            | Self::AlreadySatisfied(r)
            | Self::Failed(r)
            | Self::UnknownReturnCode(r) => r,
        }
    }

    /// Builds the changed/ok/failed report handed back to an actuator.
    pub fn report(&self) -> Report {
        let r = self.result();
        let mut report = Report {
            changed: false,
            failed: false,
            msg: None,
            return_code: r.return_code,
            reason_code: r.reason_code,
            return_stdout: r.message_text.clone(),
            return_stderr: Vec::new(),
            would_send: None,
        };
        match self {
            Self::Changed(_) => report.changed = true,
            Self::AlreadySatisfied(_) => report.return_stdout.push_str(SKIP_NOTE),
            Self::Failed(_) => {
                report.failed = true;
                report.msg = Some(format!(
                    "failing return code from SMAPI is: {}",
                    r.return_code
                ));
            }
            Self::UnknownReturnCode(_) => {
                report.failed = true;
                report.msg = Some(format!(
                    "unknown return code from SMAPI: {}",
                    r.return_code
                ));
                report.return_stderr.push(UNKNOWN_CODE_NOTE.to_owned());
            }
        }
        report
    }
}

/// Serializable actuator report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub struct Report {
    /// The operation modified the system.
    pub changed: bool,
    /// The operation failed.
    pub failed: bool,
    /// Failure summary, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// SMAPI return code.
    pub return_code: i64,
    /// SMAPI reason code.
    pub reason_code: i64,
    /// Message text returned by SMAPI.
    pub return_stdout: String,
    /// Diagnostics produced while classifying, one per line.
    pub return_stderr: Vec<String>,
    /// Request a check-mode run would have sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub would_send: Option<PlannedCall>,
}

impl Report {
    /// Unchanged report for a check-mode run: nothing is sent and both
    /// codes stay at [`UNSET_CODE`].
    pub fn check(planned: PlannedCall) -> Self {
        Self {
            changed: false,
            failed: false,
            msg: None,
            return_code: UNSET_CODE,
            reason_code: UNSET_CODE,
            return_stdout: String::new(),
            return_stderr: Vec::new(),
            would_send: Some(planned),
        }
    }
}

/// A call that was planned but not issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCall {
    /// SMAPI function name.
    pub api_name: String,
    /// Target image.
    pub target: String,
    /// Parameters after the target.
    pub command_text: String,
}

impl PlannedCall {
    /// Plans a raw call.
    pub fn new(
        api_name: impl Into<String>,
        target: impl Into<String>,
        command_text: impl Into<String>,
    ) -> Self {
        Self {
            api_name: api_name.into(),
            target: target.into(),
            command_text: command_text.into(),
        }
    }

    /// Plans `op` against `target`.
    pub fn of(target: &str, op: &impl Operation) -> Self {
        Self::new(op.api_name(), target, op.command_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NicDef, NicType};

    const ALREADY_DEFINED: &str = "Image or profile name already defined";

    fn result(rc: i64, text: &str) -> CallResult {
        CallResult {
            return_code: rc,
            reason_code: 8,
            message_text: text.to_owned(),
        }
    }

    #[test]
    fn zero_is_changed_and_passes_text_through() {
        let r = result(0, "Done\n");
        let outcome = classify(&r, &[ALREADY_DEFINED]);
        assert_eq!(outcome, Outcome::Changed(r));
        assert_eq!(outcome.result().message_text, "Done\n");
        assert!(outcome.is_changed());
    }

    #[test]
    fn benign_match_is_already_satisfied() {
        let r = result(
            400,
            "Failed\n  Description: ULGSMC5400E Image or profile name already defined\n",
        );
        let outcome = classify(&r, &[ALREADY_DEFINED]);
        assert!(matches!(outcome, Outcome::AlreadySatisfied(_)));
        assert!(outcome.is_ok());
        assert!(!outcome.is_changed());
    }

    #[test]
    fn unmatched_is_failed_with_code() {
        let r = result(400, "ULGSMC5400E some other error");
        let outcome = classify(&r, &[ALREADY_DEFINED]);
        match &outcome {
            Outcome::Failed(r) => {
                assert_eq!(r.return_code, 400);
                assert_eq!(r.message_text, "ULGSMC5400E some other error");
            }
            other => panic!("expected Failed, got {other:?}"),
        }
        assert!(!outcome.is_ok());
    }

    #[test]
    fn several_matches_still_satisfied() {
        let r = result(200, "HCPUSO045E LINUX01 not logged on");
        let benign = ["Image already active", "HCPUSO045E", "not logged on"];
        assert!(matches!(
            classify(&r, &benign),
            Outcome::AlreadySatisfied(_)
        ));
    }

    #[test]
    fn match_is_case_sensitive() {
        let r = result(400, "image or profile name ALREADY DEFINED");
        assert!(matches!(
            classify(&r, &[ALREADY_DEFINED]),
            Outcome::Failed(_)
        ));
    }

    #[test]
    fn negative_code_is_unknown() {
        let r = result(-9, "");
        assert!(matches!(
            classify(&r, &[ALREADY_DEFINED]),
            Outcome::UnknownReturnCode(_)
        ));
    }

    #[test]
    fn empty_patterns_are_ignored() {
        let r = result(4, "anything");
        assert!(matches!(classify(&r, &[""]), Outcome::Failed(_)));
        let none: [&str; 0] = [];
        assert!(matches!(classify(&r, &none), Outcome::Failed(_)));
    }

    #[test]
    fn classify_is_deterministic() {
        let r = result(400, "ULGSMC5400E Image or profile name already defined");
        let a = classify(&r, &[ALREADY_DEFINED]);
        let b = classify(&r, &[ALREADY_DEFINED]);
        assert_eq!(a, b);
    }

    #[test]
    fn report_shapes() {
        let changed = classify(&result(0, "ok\n"), &[ALREADY_DEFINED]).report();
        assert!(changed.changed && !changed.failed);
        assert_eq!(changed.msg, None);

        let skipped =
            classify(&result(400, ALREADY_DEFINED), &[ALREADY_DEFINED]).report();
        assert!(!skipped.changed && !skipped.failed);
        assert!(skipped.return_stdout.ends_with(SKIP_NOTE));

        let failed = classify(&result(24, "bad"), &[ALREADY_DEFINED]).report();
        assert!(failed.failed);
        assert_eq!(
            failed.msg.as_deref(),
            Some("failing return code from SMAPI is: 24")
        );

        let unknown = classify(&result(-1, ""), &[ALREADY_DEFINED]).report();
        assert_eq!(
            unknown.msg.as_deref(),
            Some("unknown return code from SMAPI: -1")
        );
    }

    #[test]
    fn only_unknown_code_fills_stderr() {
        for rc in [0, 24] {
            let report = classify(&result(rc, "x"), &[ALREADY_DEFINED]).report();
            assert!(report.return_stderr.is_empty(), "rc {rc}");
        }
        let skipped = classify(&result(400, ALREADY_DEFINED), &[ALREADY_DEFINED]).report();
        assert!(skipped.return_stderr.is_empty());

        let unknown = classify(&result(-9, ""), &[ALREADY_DEFINED]).report();
        assert!(unknown.failed);
        assert_eq!(unknown.return_stderr, [UNKNOWN_CODE_NOTE]);
    }

    #[test]
    fn check_report_is_unchanged() {
        let op = NicDef::define("0600", NicType::Hiper);
        let report = Report::check(PlannedCall::of("LINUX01", &op));
        assert!(!report.changed && !report.failed);
        assert_eq!(report.return_code, UNSET_CODE);
        assert_eq!(report.reason_code, UNSET_CODE);
        assert!(report.return_stdout.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["would_send"]["api_name"], "Dirm_Nicdef");
        assert_eq!(json["would_send"]["target"], "LINUX01");
        assert_eq!(json["would_send"]["command_text"], "0600 TYPE HIPER");
        assert_eq!(json["return_stderr"], serde_json::json!([]));
    }

    #[test]
    fn report_serializes_without_empty_msg() {
        let report = classify(&result(0, ""), &[ALREADY_DEFINED]).report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["changed"], true);
        assert!(json.get("msg").is_none());
        assert!(json.get("would_send").is_none());
    }
}
