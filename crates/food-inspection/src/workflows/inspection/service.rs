use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use super::access::{AccessContext, AccessError};
use super::catalog::Catalog;
use super::domain::{
    Branch, BranchId, Category, CategoryId, InspectionItem, ItemEdit, ItemId, Judgment,
    NewBranch, NewItem, NewVisit, ResultEntry, ValidationError, Visit, VisitId,
};
use super::import::{ImportSummary, ImportedCatalog};
use super::judging::{clamp_observation, PendingObservation, StagedObservations};
use super::repository::{InspectionStore, RepositoryError};
use super::scoring::{score_visit, ScoringConfig, VisitScore};
use super::trends::{
    aggregate_by_month, branch_dashboard, group_visit_log, BranchDashboard, BranchFilter,
    MonthlyTrendPoint, MonthlyVisitGroup,
};

/// Service composing the store, the catalog rules, the judging workflow and scoring.
///
/// Every judgment runs as one pipeline: upsert the entry, recompute the visit's totals
/// against the current active checklist, persist them.
pub struct InspectionService<S> {
    store: Arc<S>,
    scoring: ScoringConfig,
    staged: Mutex<StagedObservations>,
    sequence: AtomicU64,
}

impl<S> InspectionService<S>
where
    S: InspectionStore + 'static,
{
    pub fn new(store: Arc<S>, scoring: ScoringConfig) -> Self {
        Self {
            store,
            scoring,
            staged: Mutex::new(StagedObservations::default()),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn scoring_config(&self) -> &ScoringConfig {
        &self.scoring
    }

    fn next_id(&self, prefix: &str) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{id:06}")
    }

    fn staged(&self) -> MutexGuard<'_, StagedObservations> {
        // drafts are plain strings, a poisoned guard still holds usable data
        self.staged
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn branches(&self) -> Result<Vec<Branch>, InspectionServiceError> {
        Ok(self.store.branches()?)
    }

    pub fn add_branch(&self, new_branch: NewBranch) -> Result<Branch, InspectionServiceError> {
        new_branch.validate()?;
        let branch = Branch {
            id: BranchId(self.next_id("branch")),
            name: new_branch.name.trim().to_string(),
            responsible: new_branch
                .responsible
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
        };
        let stored = self.store.insert_branch(branch)?;
        info!(branch = %stored.id, name = %stored.name, "branch added");
        Ok(stored)
    }

    /// Delete a branch with its visits and their results.
    pub fn remove_branch(&self, id: &BranchId) -> Result<(), InspectionServiceError> {
        let visits = self.store.visits(Some(id))?;
        self.store.delete_branch(id)?;
        let mut staged = self.staged();
        for visit in &visits {
            staged.discard_visit(&visit.id);
        }
        info!(branch = %id, visits = visits.len(), "branch removed");
        Ok(())
    }

    pub fn catalog(&self) -> Result<Catalog, InspectionServiceError> {
        Ok(Catalog::new(self.store.categories()?, self.store.items()?))
    }

    pub fn add_category(&self, name: &str) -> Result<Category, InspectionServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingCategoryName.into());
        }
        let mut catalog = self.catalog()?;
        let category = Category {
            id: CategoryId(self.next_id("category")),
            name: name.to_string(),
            sort_order: catalog.next_category_sort_order(),
        };
        catalog.categories.push(category.clone());
        catalog.validate()?;
        Ok(self.store.insert_category(category)?)
    }

    pub fn add_item(&self, new_item: NewItem) -> Result<InspectionItem, InspectionServiceError> {
        let catalog = self.catalog()?;
        let item = catalog.prepare_item(ItemId(self.next_id("item")), new_item, &self.scoring)?;
        let stored = self.store.insert_item(item)?;
        info!(
            item = %stored.id,
            question = stored.question_number,
            weight = stored.weight.value(),
            "checklist item added"
        );
        Ok(stored)
    }

    pub fn edit_item(
        &self,
        id: &ItemId,
        edit: ItemEdit,
    ) -> Result<InspectionItem, InspectionServiceError> {
        let mut item = self
            .catalog()?
            .item(id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;

        if let Some(description) = edit.description {
            let description = description.trim();
            if description.is_empty() {
                return Err(ValidationError::MissingDescription.into());
            }
            item.description = description.to_string();
        }

        let weight_changed = edit.weight.is_some_and(|weight| weight != item.weight);
        if let Some(weight) = edit.weight {
            item.weight = weight;
        }

        let points = match edit.points {
            Some(points) => Some(points),
            None if weight_changed => Some(self.scoring.points_for(item.weight)),
            None => None,
        };
        if let Some(points) = points {
            points.validate()?;
            item.points_positive = points.positive;
            item.points_negative = points.negative;
        }

        self.store.update_item(item.clone())?;
        info!(item = %item.id, "checklist item updated");
        Ok(item)
    }

    /// Toggle whether an item takes part in new scoring. Stored visit totals are only
    /// refreshed when their results next change.
    pub fn set_item_active(&self, id: &ItemId, active: bool) -> Result<(), InspectionServiceError> {
        self.store.set_item_active(id, active)?;
        info!(item = %id, active, "checklist item toggled");
        Ok(())
    }

    pub fn remove_item(&self, id: &ItemId) -> Result<(), InspectionServiceError> {
        self.store.delete_item(id)?;
        info!(item = %id, "checklist item removed");
        Ok(())
    }

    /// Create missing categories by name, then append every imported item.
    pub fn import_catalog(
        &self,
        imported: ImportedCatalog,
    ) -> Result<ImportSummary, InspectionServiceError> {
        let mut summary = ImportSummary::default();

        for name in imported.category_names() {
            if self.catalog()?.category_by_name(&name).is_none() {
                self.add_category(&name)?;
                summary.categories_created += 1;
            }
        }

        for row in imported.items {
            let catalog = self.catalog()?;
            let category_id = catalog
                .category_by_name(&row.category)
                .map(|category| category.id.clone());
            self.add_item(NewItem {
                category_id,
                description: row.description,
                weight: row.weight,
                points: row.points,
            })?;
            summary.items_created += 1;
        }

        info!(
            categories = summary.categories_created,
            items = summary.items_created,
            "catalog imported"
        );
        Ok(summary)
    }

    pub fn visits(&self, branch: Option<&BranchId>) -> Result<Vec<Visit>, InspectionServiceError> {
        Ok(self.store.visits(branch)?)
    }

    /// Open a visit for a branch; the calling actor is recorded as the inspector.
    pub fn open_visit(
        &self,
        context: &AccessContext,
        new_visit: NewVisit,
    ) -> Result<Visit, InspectionServiceError> {
        let inspector = context.require_actor()?;

        let branch_known = self
            .store
            .branches()?
            .iter()
            .any(|branch| branch.id == new_visit.branch_id);
        if !branch_known {
            return Err(ValidationError::UnknownBranch(new_visit.branch_id).into());
        }

        let visit = Visit {
            id: VisitId(self.next_id("visit")),
            branch_id: new_visit.branch_id,
            visit_date: new_visit.visit_date,
            notes: new_visit
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            inspector_id: Some(inspector.id.clone()),
            total_score: None,
            max_possible_score: None,
        };
        let stored = self.store.insert_visit(visit)?;
        info!(visit = %stored.id, branch = %stored.branch_id, date = %stored.visit_date, "visit opened");
        Ok(stored)
    }

    pub fn remove_visit(&self, id: &VisitId) -> Result<(), InspectionServiceError> {
        self.store.delete_visit(id)?;
        self.staged().discard_visit(id);
        info!(visit = %id, "visit removed");
        Ok(())
    }

    pub fn results(&self, visit_id: &VisitId) -> Result<Vec<ResultEntry>, InspectionServiceError> {
        self.existing_visit(visit_id)?;
        Ok(self.store.results(visit_id)?)
    }

    /// Live score of a visit without persisting anything.
    pub fn visit_score(&self, visit_id: &VisitId) -> Result<VisitScore, InspectionServiceError> {
        self.existing_visit(visit_id)?;
        let entries = self.store.results(visit_id)?;
        let active = self.store.active_items()?;
        Ok(score_visit(&entries, &active))
    }

    /// Mark an item conforming. Clears any stored observation and any staged draft.
    pub fn record_conforming(
        &self,
        visit_id: &VisitId,
        item_id: &ItemId,
    ) -> Result<VisitScore, InspectionServiceError> {
        self.existing_visit(visit_id)?;
        let item = self.judgeable_item(item_id)?;

        let entry = ResultEntry::judged(visit_id.clone(), &item, Judgment::Conforming);
        self.store.upsert_result(entry)?;
        // drafts outlive a failed write
        self.staged().take(visit_id, item_id);
        self.recompute(visit_id)
    }

    /// First step of a non-conformity: stage a draft observation. Nothing is stored yet.
    pub fn stage_nonconformity(
        &self,
        visit_id: &VisitId,
        item_id: &ItemId,
    ) -> Result<PendingObservation, InspectionServiceError> {
        self.existing_visit(visit_id)?;
        self.judgeable_item(item_id)?;

        let existing = self
            .store
            .results(visit_id)?
            .into_iter()
            .find(|entry| &entry.item_id == item_id)
            .and_then(|entry| entry.judgment.observation().map(str::to_string));

        let pending = self
            .staged()
            .stage(visit_id, item_id, existing.as_deref());
        debug!(visit = %visit_id, item = %item_id, "non-conformity staged");
        Ok(pending)
    }

    /// Second step: store the non-conforming judgment with its observation. The staged draft
    /// is consumed only once the result is stored.
    pub fn commit_nonconformity(
        &self,
        visit_id: &VisitId,
        item_id: &ItemId,
        observation: &str,
    ) -> Result<VisitScore, InspectionServiceError> {
        self.existing_visit(visit_id)?;
        let item = self.judgeable_item(item_id)?;
        if !self.is_staged(visit_id, item_id) {
            return Err(ValidationError::NothingStaged {
                visit_id: visit_id.clone(),
                item_id: item_id.clone(),
            }
            .into());
        }

        let judgment = Judgment::NonConforming {
            observation: clamp_observation(observation),
        };
        let entry = ResultEntry::judged(visit_id.clone(), &item, judgment);
        self.store.upsert_result(entry)?;
        self.staged().take(visit_id, item_id);
        self.recompute(visit_id)
    }

    /// Abandon a staged draft. Returns whether one existed.
    pub fn cancel_nonconformity(&self, visit_id: &VisitId, item_id: &ItemId) -> bool {
        self.staged().take(visit_id, item_id).is_some()
    }

    pub fn is_staged(&self, visit_id: &VisitId, item_id: &ItemId) -> bool {
        self.staged().is_staged(visit_id, item_id)
    }

    /// Recompute and persist a visit's totals from its current results and the current
    /// active checklist. Idempotent.
    pub fn recompute(&self, visit_id: &VisitId) -> Result<VisitScore, InspectionServiceError> {
        let entries = self.store.results(visit_id)?;
        let active = self.store.active_items()?;
        let score = score_visit(&entries, &active);

        self.store
            .update_visit_scores(visit_id, score.total_score, score.max_possible)?;
        debug!(
            visit = %visit_id,
            total = score.total_score,
            max = score.max_possible,
            percentage = ?score.percentage,
            "visit totals recomputed"
        );
        Ok(score)
    }

    pub fn monthly_trend(
        &self,
        year: Option<i32>,
        branch: &BranchFilter,
    ) -> Result<Vec<MonthlyTrendPoint>, InspectionServiceError> {
        let visits = match branch {
            BranchFilter::All => self.store.visits(None)?,
            BranchFilter::Only(id) => self.store.visits(Some(id))?,
        };
        Ok(aggregate_by_month(&visits, year, branch))
    }

    pub fn visit_log(
        &self,
        branch: &BranchId,
    ) -> Result<Vec<MonthlyVisitGroup>, InspectionServiceError> {
        let visits = self.store.visits(Some(branch))?;
        Ok(group_visit_log(&visits))
    }

    pub fn dashboard(&self, branch: &BranchId) -> Result<BranchDashboard, InspectionServiceError> {
        let visits = self.store.visits(Some(branch))?;
        Ok(branch_dashboard(branch, &visits))
    }

    fn existing_visit(&self, visit_id: &VisitId) -> Result<Visit, InspectionServiceError> {
        Ok(self
            .store
            .visit(visit_id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    fn judgeable_item(&self, item_id: &ItemId) -> Result<InspectionItem, InspectionServiceError> {
        let item = self
            .catalog()?
            .item(item_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;
        if !item.is_active {
            return Err(ValidationError::InactiveItem(item.id).into());
        }
        Ok(item)
    }
}

/// Error raised by the inspection service.
#[derive(Debug, thiserror::Error)]
pub enum InspectionServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Access(#[from] AccessError),
}
