//! Food-safety inspection tracking: branch checklists, per-visit judgments, conformity
//! scoring and monthly trends.
//!
//! Judgments flow through [`InspectionService`], which upserts the result entry, recomputes
//! the visit's totals against the current active checklist and persists them in one call.

pub mod access;
pub mod catalog;
pub mod domain;
pub mod import;
pub(crate) mod judging;
pub mod memory;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod trends;

#[cfg(test)]
mod tests;

pub use access::{
    list_users, resolve_context, AccessContext, AccessError, Actor, ActorDirectory,
    IdentityError, IdentityProvider, Role, UserSummary,
};
pub use catalog::{Catalog, CatalogSection};
pub use domain::{
    ActorId, Branch, BranchId, Category, CategoryId, InspectionItem, ItemEdit, ItemId, Judgment,
    NewBranch, NewItem, NewVisit, PointValues, ResultEntry, ValidationError, Visit, VisitId,
    Weight,
};
pub use import::{
    CatalogImportError, CatalogImporter, ImportSummary, ImportedCatalog, ImportedItem,
    VisitLedger,
};
pub use judging::{PendingObservation, OBSERVATION_MAX_CHARS};
pub use memory::MemoryInspectionStore;
pub use repository::{InspectionStore, RepositoryError};
pub use router::{inspection_router, ACTOR_HEADER};
pub use scoring::{
    classify, percentage, reference_rows, score_visit, EvaluationLabel, ReferenceRow,
    ScoringConfig, VisitScore, EVALUATION_SCALE,
};
pub use service::{InspectionService, InspectionServiceError};
pub use trends::{
    aggregate_by_month, branch_dashboard, group_visit_log, AttentionLevel, BranchDashboard,
    BranchFilter, ChartBand, MonthBucket, MonthlyTrendPoint, MonthlyVisitGroup, VisitLogEntry,
};
