use super::domain::{
    Branch, BranchId, Category, InspectionItem, ItemId, ResultEntry, Visit, VisitId,
};

/// Persistence collaborator for branches, the checklist catalog, visits and results.
///
/// Implementations own ordering: categories and items by `sort_order`, branches by name,
/// visits by date descending.
pub trait InspectionStore: Send + Sync {
    fn branches(&self) -> Result<Vec<Branch>, RepositoryError>;
    fn insert_branch(&self, branch: Branch) -> Result<Branch, RepositoryError>;
    /// Removes the branch together with its visits and their results.
    fn delete_branch(&self, id: &BranchId) -> Result<(), RepositoryError>;

    fn categories(&self) -> Result<Vec<Category>, RepositoryError>;
    fn insert_category(&self, category: Category) -> Result<Category, RepositoryError>;

    fn items(&self) -> Result<Vec<InspectionItem>, RepositoryError>;
    fn active_items(&self) -> Result<Vec<InspectionItem>, RepositoryError>;
    fn insert_item(&self, item: InspectionItem) -> Result<InspectionItem, RepositoryError>;
    fn update_item(&self, item: InspectionItem) -> Result<(), RepositoryError>;
    fn set_item_active(&self, id: &ItemId, active: bool) -> Result<(), RepositoryError>;
    fn delete_item(&self, id: &ItemId) -> Result<(), RepositoryError>;

    fn visits(&self, branch: Option<&BranchId>) -> Result<Vec<Visit>, RepositoryError>;
    fn visit(&self, id: &VisitId) -> Result<Option<Visit>, RepositoryError>;
    fn insert_visit(&self, visit: Visit) -> Result<Visit, RepositoryError>;
    fn update_visit_scores(
        &self,
        id: &VisitId,
        total_score: i32,
        max_possible_score: i32,
    ) -> Result<(), RepositoryError>;
    /// Removes the visit together with its results.
    fn delete_visit(&self, id: &VisitId) -> Result<(), RepositoryError>;

    fn results(&self, visit: &VisitId) -> Result<Vec<ResultEntry>, RepositoryError>;
    /// Inserts or replaces the entry keyed by `(visit_id, item_id)`.
    fn upsert_result(&self, entry: ResultEntry) -> Result<ResultEntry, RepositoryError>;
}

/// Error enumeration for persistence failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
