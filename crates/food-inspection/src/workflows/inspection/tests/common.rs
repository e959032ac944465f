use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::inspection::access::{AccessContext, Actor, ActorDirectory, Role};
use crate::workflows::inspection::domain::{
    ActorId, Branch, BranchId, Category, InspectionItem, ItemId, NewBranch, NewItem, NewVisit,
    ResultEntry, Visit, VisitId, Weight,
};
use crate::workflows::inspection::memory::MemoryInspectionStore;
use crate::workflows::inspection::repository::{InspectionStore, RepositoryError};
use crate::workflows::inspection::scoring::ScoringConfig;
use crate::workflows::inspection::service::InspectionService;
use crate::workflows::inspection::inspection_router;

pub(super) const ADMIN_TOKEN: &str = "token-admin";
pub(super) const EMPLOYEE_TOKEN: &str = "token-employee";

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn inspector() -> Actor {
    Actor {
        id: ActorId::from("inspector-1"),
        display_name: Some("Marina".to_string()),
    }
}

pub(super) fn admin_context() -> AccessContext {
    AccessContext::authenticated(inspector(), [Role::Admin, Role::Employee])
}

pub(super) fn directory() -> ActorDirectory {
    ActorDirectory::default()
        .with_actor(ADMIN_TOKEN, inspector(), [Role::Admin, Role::Employee])
        .with_actor(
            EMPLOYEE_TOKEN,
            Actor {
                id: ActorId::from("staff-1"),
                display_name: None,
            },
            [Role::Employee],
        )
}

pub(super) fn build_service() -> (Arc<InspectionService<MemoryInspectionStore>>, MemoryInspectionStore) {
    let store = MemoryInspectionStore::default();
    let service = InspectionService::new(Arc::new(store.clone()), ScoringConfig::default());
    (Arc::new(service), store)
}

pub(super) fn router_with(service: Arc<InspectionService<MemoryInspectionStore>>) -> Router {
    inspection_router(service, Arc::new(directory()), Duration::from_secs(1))
}

pub(super) struct Checklist {
    pub branch: Branch,
    pub category: Category,
    pub items: Vec<InspectionItem>,
}

/// One branch and one category holding two weight-1 items (+50/-100 each).
pub(super) fn seed_checklist<S>(service: &InspectionService<S>) -> Checklist
where
    S: InspectionStore + 'static,
{
    let branch = service
        .add_branch(NewBranch {
            name: "Centro".to_string(),
            responsible: Some("Joana".to_string()),
        })
        .expect("branch added");
    let category = service
        .add_category("Higiene pessoal")
        .expect("category added");
    let items = ["Uniformes limpos e completos", "Mãos lavadas antes da manipulação"]
        .into_iter()
        .map(|description| {
            service
                .add_item(NewItem {
                    category_id: Some(category.id.clone()),
                    description: description.to_string(),
                    weight: Weight::One,
                    points: None,
                })
                .expect("item added")
        })
        .collect();

    Checklist {
        branch,
        category,
        items,
    }
}

pub(super) fn open_visit<S>(service: &InspectionService<S>, branch: &BranchId, on: NaiveDate) -> Visit
where
    S: InspectionStore + 'static,
{
    service
        .open_visit(
            &admin_context(),
            NewVisit {
                branch_id: branch.clone(),
                visit_date: on,
                notes: None,
            },
        )
        .expect("visit opened")
}

pub(super) fn scored_visit(branch: &str, on: NaiveDate, total: i32, max: i32) -> Visit {
    Visit {
        id: VisitId(format!("{branch}-{on}")),
        branch_id: BranchId::from(branch),
        visit_date: on,
        notes: None,
        inspector_id: None,
        total_score: Some(total),
        max_possible_score: Some(max),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json")
}

/// Store whose backend is down for every call.
pub(super) struct UnavailableStore;

impl UnavailableStore {
    fn down<T>() -> Result<T, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl InspectionStore for UnavailableStore {
    fn branches(&self) -> Result<Vec<Branch>, RepositoryError> {
        Self::down()
    }

    fn insert_branch(&self, _branch: Branch) -> Result<Branch, RepositoryError> {
        Self::down()
    }

    fn delete_branch(&self, _id: &BranchId) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Self::down()
    }

    fn insert_category(&self, _category: Category) -> Result<Category, RepositoryError> {
        Self::down()
    }

    fn items(&self) -> Result<Vec<InspectionItem>, RepositoryError> {
        Self::down()
    }

    fn active_items(&self) -> Result<Vec<InspectionItem>, RepositoryError> {
        Self::down()
    }

    fn insert_item(&self, _item: InspectionItem) -> Result<InspectionItem, RepositoryError> {
        Self::down()
    }

    fn update_item(&self, _item: InspectionItem) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn set_item_active(&self, _id: &ItemId, _active: bool) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn delete_item(&self, _id: &ItemId) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn visits(&self, _branch: Option<&BranchId>) -> Result<Vec<Visit>, RepositoryError> {
        Self::down()
    }

    fn visit(&self, _id: &VisitId) -> Result<Option<Visit>, RepositoryError> {
        Self::down()
    }

    fn insert_visit(&self, _visit: Visit) -> Result<Visit, RepositoryError> {
        Self::down()
    }

    fn update_visit_scores(
        &self,
        _id: &VisitId,
        _total_score: i32,
        _max_possible_score: i32,
    ) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn delete_visit(&self, _id: &VisitId) -> Result<(), RepositoryError> {
        Self::down()
    }

    fn results(&self, _visit: &VisitId) -> Result<Vec<ResultEntry>, RepositoryError> {
        Self::down()
    }

    fn upsert_result(&self, _entry: ResultEntry) -> Result<ResultEntry, RepositoryError> {
        Self::down()
    }
}

/// In-memory store whose result writes can be switched off to simulate a backend outage.
#[derive(Clone, Default)]
pub(super) struct FlakyResultStore {
    inner: MemoryInspectionStore,
    writes_down: Arc<AtomicBool>,
}

impl FlakyResultStore {
    pub(super) fn set_writes_down(&self, down: bool) {
        self.writes_down.store(down, Ordering::SeqCst);
    }
}

impl InspectionStore for FlakyResultStore {
    fn branches(&self) -> Result<Vec<Branch>, RepositoryError> {
        self.inner.branches()
    }

    fn insert_branch(&self, branch: Branch) -> Result<Branch, RepositoryError> {
        self.inner.insert_branch(branch)
    }

    fn delete_branch(&self, id: &BranchId) -> Result<(), RepositoryError> {
        self.inner.delete_branch(id)
    }

    fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.inner.categories()
    }

    fn insert_category(&self, category: Category) -> Result<Category, RepositoryError> {
        self.inner.insert_category(category)
    }

    fn items(&self) -> Result<Vec<InspectionItem>, RepositoryError> {
        self.inner.items()
    }

    fn active_items(&self) -> Result<Vec<InspectionItem>, RepositoryError> {
        self.inner.active_items()
    }

    fn insert_item(&self, item: InspectionItem) -> Result<InspectionItem, RepositoryError> {
        self.inner.insert_item(item)
    }

    fn update_item(&self, item: InspectionItem) -> Result<(), RepositoryError> {
        self.inner.update_item(item)
    }

    fn set_item_active(&self, id: &ItemId, active: bool) -> Result<(), RepositoryError> {
        self.inner.set_item_active(id, active)
    }

    fn delete_item(&self, id: &ItemId) -> Result<(), RepositoryError> {
        self.inner.delete_item(id)
    }

    fn visits(&self, branch: Option<&BranchId>) -> Result<Vec<Visit>, RepositoryError> {
        self.inner.visits(branch)
    }

    fn visit(&self, id: &VisitId) -> Result<Option<Visit>, RepositoryError> {
        self.inner.visit(id)
    }

    fn insert_visit(&self, visit: Visit) -> Result<Visit, RepositoryError> {
        self.inner.insert_visit(visit)
    }

    fn update_visit_scores(
        &self,
        id: &VisitId,
        total_score: i32,
        max_possible_score: i32,
    ) -> Result<(), RepositoryError> {
        self.inner
            .update_visit_scores(id, total_score, max_possible_score)
    }

    fn delete_visit(&self, id: &VisitId) -> Result<(), RepositoryError> {
        self.inner.delete_visit(id)
    }

    fn results(&self, visit: &VisitId) -> Result<Vec<ResultEntry>, RepositoryError> {
        self.inner.results(visit)
    }

    fn upsert_result(&self, entry: ResultEntry) -> Result<ResultEntry, RepositoryError> {
        if self.writes_down.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("results table offline".to_string()));
        }
        self.inner.upsert_result(entry)
    }
}
