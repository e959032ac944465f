//! Visit scoring: point accumulation, the conformity percentage and its evaluation tier.

mod config;
mod rules;
mod scale;

pub use config::ScoringConfig;
pub use scale::{classify, reference_rows, EvaluationLabel, ReferenceRow, EVALUATION_SCALE};

use rules::clamp_i32;

use super::domain::{InspectionItem, ResultEntry};
use serde::{Deserialize, Serialize};

/// Totals derived from a visit's result set against the current active checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitScore {
    pub total_score: i32,
    pub max_possible: i32,
    /// `None` when the checklist has no positive points to score against.
    pub percentage: Option<i32>,
    pub evaluation: Option<EvaluationLabel>,
    pub conforming: usize,
    pub non_conforming: usize,
    pub unjudged: usize,
}

impl VisitScore {
    pub fn evaluation_label(&self) -> &'static str {
        self.evaluation.map(EvaluationLabel::label).unwrap_or("—")
    }
}

/// Reduce a result set into visit totals.
///
/// `active_items` should be the checklist as it stands now; inactive entries in the slice
/// are ignored for the maximum. Entries keep their frozen scores regardless of whether
/// their item is still active.
pub fn score_visit(entries: &[ResultEntry], active_items: &[InspectionItem]) -> VisitScore {
    let total = rules::total_score(entries);
    let max = rules::max_possible(active_items);
    let percentage = percentage(total, max);
    let tally = rules::tally(entries, active_items);

    VisitScore {
        total_score: clamp_i32(total),
        max_possible: clamp_i32(max),
        percentage,
        evaluation: percentage.map(classify),
        conforming: tally.conforming,
        non_conforming: tally.non_conforming,
        unjudged: tally.unjudged,
    }
}

/// `round(total / max * 100)`, or `None` when `max` is not positive.
pub fn percentage(total: i64, max: i64) -> Option<i32> {
    rules::rounded_percentage(total, max).map(clamp_i32)
}
