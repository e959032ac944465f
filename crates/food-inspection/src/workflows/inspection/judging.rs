use std::collections::HashMap;

use serde::Serialize;

use super::domain::{ItemId, VisitId};

/// Longest observation kept for a non-conformity.
pub const OBSERVATION_MAX_CHARS: usize = 1000;

/// An observation being written for a non-conforming item, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingObservation {
    pub visit_id: VisitId,
    pub item_id: ItemId,
    pub draft: String,
}

/// Drafts staged between marking an item irregular and saving its observation.
#[derive(Debug, Default)]
pub struct StagedObservations {
    drafts: HashMap<(VisitId, ItemId), String>,
}

impl StagedObservations {
    /// Stage a draft, seeded with the observation already stored for the pair.
    pub fn stage(
        &mut self,
        visit_id: &VisitId,
        item_id: &ItemId,
        existing: Option<&str>,
    ) -> PendingObservation {
        let draft = clamp_observation(existing.unwrap_or_default());
        self.drafts
            .insert((visit_id.clone(), item_id.clone()), draft.clone());
        PendingObservation {
            visit_id: visit_id.clone(),
            item_id: item_id.clone(),
            draft,
        }
    }

    pub fn take(&mut self, visit_id: &VisitId, item_id: &ItemId) -> Option<String> {
        self.drafts.remove(&(visit_id.clone(), item_id.clone()))
    }

    pub fn is_staged(&self, visit_id: &VisitId, item_id: &ItemId) -> bool {
        self.drafts
            .contains_key(&(visit_id.clone(), item_id.clone()))
    }

    /// Drop every draft belonging to a visit.
    pub fn discard_visit(&mut self, visit_id: &VisitId) {
        self.drafts.retain(|(visit, _), _| visit != visit_id);
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}

pub fn clamp_observation(text: &str) -> String {
    text.chars().take(OBSERVATION_MAX_CHARS).collect()
}
