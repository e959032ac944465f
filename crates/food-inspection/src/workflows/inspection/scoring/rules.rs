use std::collections::HashMap;

use super::super::domain::{InspectionItem, ItemId, Judgment, ResultEntry};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct JudgmentTally {
    pub conforming: usize,
    pub non_conforming: usize,
    pub unjudged: usize,
}

pub(crate) fn total_score(entries: &[ResultEntry]) -> i64 {
    entries.iter().map(ResultEntry::contribution).sum()
}

pub(crate) fn max_possible(items: &[InspectionItem]) -> i64 {
    items
        .iter()
        .filter(|item| item.is_active)
        .map(|item| i64::from(item.points_positive))
        .sum()
}

/// Rounds half towards positive infinity, in integer arithmetic.
pub(crate) fn rounded_percentage(total: i64, max: i64) -> Option<i64> {
    if max <= 0 {
        return None;
    }
    let numerator = total.checked_mul(200)?.checked_add(max)?;
    Some(numerator.div_euclid(max.checked_mul(2)?))
}

/// Counts judgments across the active checklist. Entries for items that were
/// deactivated after judging still count toward the score but not the tally.
pub(crate) fn tally(entries: &[ResultEntry], items: &[InspectionItem]) -> JudgmentTally {
    let by_item: HashMap<&ItemId, &Judgment> = entries
        .iter()
        .map(|entry| (&entry.item_id, &entry.judgment))
        .collect();

    let mut tally = JudgmentTally::default();
    for item in items.iter().filter(|item| item.is_active) {
        match by_item.get(&item.id) {
            Some(Judgment::Conforming) => tally.conforming += 1,
            Some(Judgment::NonConforming { .. }) => tally.non_conforming += 1,
            Some(Judgment::Unjudged) | None => tally.unjudged += 1,
        }
    }
    tally
}

pub(crate) fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
