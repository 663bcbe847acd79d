//! Evaluation compliance for delegated work.
//!
//! When a conversation turn delegated to a subagent, its output is expected to
//! pass a four-dimension evaluation before being accepted. The check reads the
//! transcript text only; it has no access to what the model intended.
//!
//! Two findings come out of a transcript. An explicit Task delegation without
//! a complete evaluation is a compliance miss: it is counted and warned about.
//! Subagent output handed back with no sign of any evaluation only earns a
//! reminder and leaves the counters alone.

use chrono::{DateTime, Utc};

use crate::patterns::{
    RE_EVALUATION_AGENT, RE_EVALUATION_MENTION, RE_EVALUATION_REPORT, RE_PERFORMANCE_DISCERNMENT,
    RE_PROCESS_DISCERNMENT, RE_PRODUCT_DISCERNMENT, RE_SUBAGENT_RETURN, RE_TASK_TOOL_USE,
    RE_VERDICT,
};
use crate::state::StateDocument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelegationCheck {
    pub delegated: bool,
    pub evaluated: bool,
    pub subagent_returned: bool,
    pub evaluation_mentioned: bool,
}

impl DelegationCheck {
    pub fn inspect(transcript: &str) -> Self {
        Self {
            delegated: detect_delegation(transcript),
            evaluated: detect_evaluation(transcript),
            subagent_returned: RE_SUBAGENT_RETURN.is_match(transcript),
            evaluation_mentioned: RE_EVALUATION_MENTION.is_match(transcript),
        }
    }

    pub fn needs_warning(&self) -> bool {
        self.delegated && !self.evaluated
    }

    /// Subagent output came back and nothing evaluated it. Never set
    /// alongside [`needs_warning`](Self::needs_warning).
    pub fn needs_reminder(&self) -> bool {
        !self.needs_warning() && self.subagent_returned && !self.evaluation_mentioned
    }

    /// Folds the check into the document's counters. Returns whether the
    /// document changed.
    pub fn apply(&self, doc: &mut StateDocument, now: DateTime<Utc>) -> bool {
        if !self.delegated {
            return false;
        }
        doc.evaluation_tracking.record_delegation(self.evaluated, now);
        true
    }
}

pub fn detect_delegation(transcript: &str) -> bool {
    RE_TASK_TOOL_USE.is_match(transcript)
}

/// A complete evaluation has a report header or an evaluation-agent call,
/// an explicit verdict, and all three discernment sections.
pub fn detect_evaluation(transcript: &str) -> bool {
    let header =
        RE_EVALUATION_REPORT.is_match(transcript) || RE_EVALUATION_AGENT.is_match(transcript);
    let verdict = RE_VERDICT.is_match(transcript);
    let discernments = RE_PRODUCT_DISCERNMENT.is_match(transcript)
        && RE_PROCESS_DISCERNMENT.is_match(transcript)
        && RE_PERFORMANCE_DISCERNMENT.is_match(transcript);
    header && verdict && discernments
}

pub fn render_missing_evaluation_warning() -> String {
    "\
# Warning: Missing 4-D Evaluation

The Task tool delegated work in this turn, but no 4-D evaluation was found.

Required action:
1. Delegate to the \"4d-evaluation\" agent with the Task tool.
2. Provide the subagent output for evaluation.
3. Act on the verdict: EXCELLENT means accept and deliver, NEEDS REFINEMENT means re-delegate with coaching.

Evaluation dimensions:
- Product Discernment: correctness, completeness, and whether it solves the real need
- Process Discernment: sound reasoning and thoroughness
- Performance Discernment: meets the codebase's standards without shortcuts

Do not accept subagent work without an evaluation.
"
    .to_string()
}

pub fn render_evaluation_reminder() -> String {
    "\
# Reminder: Evaluate Subagent Output

Subagent output was received. Run a 4-D evaluation before accepting it:
delegate to the \"4d-evaluation\" agent with the Task tool and include the output.

Accept the work only after the evaluation passes. Refine and re-delegate if it finds issues.
"
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FULL_EVALUATION: &str = r#"
        <invoke name="Task"> subagent_type="4d-evaluation"
        4D-EVALUATION REPORT
        Product Discernment: solid
        Process Discernment: careful
        Performance Discernment: fast
        VERDICT: EXCELLENT
    "#;

    #[test]
    fn test_plain_reply_is_not_delegation() {
        let check = DelegationCheck::inspect("Here is the refactored function.");
        assert!(!check.delegated);
        assert!(!check.needs_warning());
    }

    #[test]
    fn test_complete_evaluation() {
        let check = DelegationCheck::inspect(FULL_EVALUATION);
        assert!(check.delegated);
        assert!(check.evaluated);
        assert!(!check.needs_warning());
    }

    #[test]
    fn test_missing_dimension_is_incomplete() {
        let text = FULL_EVALUATION.replace("Process Discernment", "Process notes");
        let check = DelegationCheck::inspect(&text);
        assert!(check.delegated);
        assert!(!check.evaluated);
        assert!(check.needs_warning());
    }

    #[test]
    fn test_verdict_required() {
        let text = FULL_EVALUATION.replace("VERDICT: EXCELLENT", "Looks fine");
        assert!(!detect_evaluation(&text));
    }

    #[test]
    fn test_apply_updates_compliance() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut doc = StateDocument::default();

        let none = DelegationCheck::default();
        assert!(!none.apply(&mut doc, now));
        assert_eq!(doc.evaluation_tracking.total_delegations, 0);

        let evaluated = DelegationCheck {
            delegated: true,
            evaluated: true,
            ..Default::default()
        };
        let skipped = DelegationCheck {
            delegated: true,
            ..Default::default()
        };
        evaluated.apply(&mut doc, now);
        skipped.apply(&mut doc, now);
        assert!(skipped.apply(&mut doc, now));

        let tracking = &doc.evaluation_tracking;
        assert_eq!(tracking.total_delegations, 3);
        assert_eq!(tracking.evaluated_delegations, 1);
        assert_eq!(tracking.skipped_evaluations, 2);
        assert_eq!(tracking.compliance_rate, 33.3);
        assert_eq!(tracking.last_checked, Some(now));
    }

    #[test]
    fn test_returned_output_without_evaluation_needs_reminder() {
        let check =
            DelegationCheck::inspect("FINDINGS: the cache is stale.\nReturning to Maestro.");
        assert!(!check.delegated);
        assert!(check.needs_reminder());
        assert!(!check.apply(&mut StateDocument::default(), Utc::now()));

        let evaluated = DelegationCheck::inspect("FINDINGS: fine.\nVERDICT: EXCELLENT");
        assert!(!evaluated.needs_reminder());
    }

    #[test]
    fn test_warning_takes_precedence_over_reminder() {
        let check = DelegationCheck::inspect(r#"<invoke name="Task"> ... Task Complete"#);
        assert!(check.needs_warning());
        assert!(!check.needs_reminder());
    }

    #[test]
    fn test_warning_mentions_dimensions() {
        let warning = render_missing_evaluation_warning();
        assert!(warning.contains("Product Discernment"));
        assert!(warning.contains("4d-evaluation"));
    }
}
