use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::inspection_status;

use super::access::{
    list_users, resolve_context, AccessContext, AccessError, IdentityProvider, Role,
};
use super::domain::{BranchId, ItemEdit, ItemId, NewBranch, NewItem, NewVisit, VisitId};
use super::import::CatalogImporter;
use super::repository::{InspectionStore, RepositoryError};
use super::scoring::{reference_rows, VisitScore, EVALUATION_SCALE};
use super::service::{InspectionService, InspectionServiceError};
use super::trends::BranchFilter;

/// Header carrying the caller's identity token.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Shared handler state: the service plus the identity collaborator.
pub struct InspectionApi<S, P> {
    service: Arc<InspectionService<S>>,
    identity: Arc<P>,
    auth_timeout: Duration,
}

impl<S, P> Clone for InspectionApi<S, P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            identity: Arc::clone(&self.identity),
            auth_timeout: self.auth_timeout,
        }
    }
}

impl<S, P> InspectionApi<S, P>
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    pub fn new(service: Arc<InspectionService<S>>, identity: Arc<P>, auth_timeout: Duration) -> Self {
        Self {
            service,
            identity,
            auth_timeout,
        }
    }

    async fn context(&self, headers: &HeaderMap) -> AccessContext {
        let token = headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok());
        resolve_context(self.identity.as_ref(), token, self.auth_timeout).await
    }

    async fn admin(&self, headers: &HeaderMap) -> Result<AccessContext, Response> {
        let context = self.context(headers).await;
        match context.require_role(Role::Admin) {
            Ok(_) => Ok(context),
            Err(error) => Err(access_response(error)),
        }
    }
}

/// Router builder exposing branches, the checklist catalog, visit judging and trends.
pub fn inspection_router<S, P>(
    service: Arc<InspectionService<S>>,
    identity: Arc<P>,
    auth_timeout: Duration,
) -> Router
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    Router::new()
        .route(
            "/api/v1/branches",
            get(list_branches_handler::<S, P>).post(create_branch_handler::<S, P>),
        )
        .route(
            "/api/v1/branches/:branch_id",
            axum::routing::delete(delete_branch_handler::<S, P>),
        )
        .route(
            "/api/v1/branches/:branch_id/dashboard",
            get(dashboard_handler::<S, P>),
        )
        .route("/api/v1/branches/:branch_id/log", get(visit_log_handler::<S, P>))
        .route("/api/v1/catalog", get(catalog_handler::<S, P>))
        .route(
            "/api/v1/catalog/categories",
            post(create_category_handler::<S, P>),
        )
        .route("/api/v1/catalog/items", post(create_item_handler::<S, P>))
        .route("/api/v1/catalog/import", post(import_catalog_handler::<S, P>))
        .route(
            "/api/v1/catalog/items/:item_id",
            put(edit_item_handler::<S, P>).delete(delete_item_handler::<S, P>),
        )
        .route(
            "/api/v1/catalog/items/:item_id/active",
            put(toggle_item_handler::<S, P>),
        )
        .route(
            "/api/v1/visits",
            get(list_visits_handler::<S, P>).post(open_visit_handler::<S, P>),
        )
        .route(
            "/api/v1/visits/:visit_id",
            axum::routing::delete(delete_visit_handler::<S, P>),
        )
        .route("/api/v1/visits/:visit_id/score", get(score_handler::<S, P>))
        .route(
            "/api/v1/visits/:visit_id/results",
            get(results_handler::<S, P>),
        )
        .route(
            "/api/v1/visits/:visit_id/items/:item_id/conforming",
            put(conforming_handler::<S, P>),
        )
        .route(
            "/api/v1/visits/:visit_id/items/:item_id/nonconformity",
            post(stage_nonconformity_handler::<S, P>)
                .put(commit_nonconformity_handler::<S, P>)
                .delete(cancel_nonconformity_handler::<S, P>),
        )
        .route("/api/v1/trends/monthly", get(monthly_trend_handler::<S, P>))
        .route("/api/v1/scoring/scale", get(scale_handler::<S, P>))
        .route("/api/v1/users", get(list_users_handler::<S, P>))
        .with_state(InspectionApi::new(service, identity, auth_timeout))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VisitsQuery {
    #[serde(default)]
    pub branch_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TrendQuery {
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub branch_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewCategoryBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveBody {
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObservationBody {
    #[serde(default)]
    pub observation: String,
}

pub(crate) async fn list_branches_handler<S, P>(State(api): State<InspectionApi<S, P>>) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    match api.service.branches() {
        Ok(branches) => (StatusCode::OK, axum::Json(branches)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_branch_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    axum::Json(new_branch): axum::Json<NewBranch>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    match api.service.add_branch(new_branch) {
        Ok(branch) => (StatusCode::CREATED, axum::Json(branch)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_branch_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    Path(branch_id): Path<String>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    match api.service.remove_branch(&BranchId(branch_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn dashboard_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    Path(branch_id): Path<String>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    match api.service.dashboard(&BranchId(branch_id)) {
        Ok(dashboard) => {
            let status = dashboard
                .latest_visit
                .as_ref()
                .and_then(|visit| visit.attention)
                .map(|level| level.label());
            let payload = json!({
                "dashboard": dashboard,
                "status": status,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn visit_log_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    Path(branch_id): Path<String>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    match api.service.visit_log(&BranchId(branch_id)) {
        Ok(groups) => (StatusCode::OK, axum::Json(groups)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn catalog_handler<S, P>(State(api): State<InspectionApi<S, P>>) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    match api.service.catalog() {
        Ok(catalog) => {
            let payload = json!({
                "sections": catalog.sections(true),
                "active_items": catalog.active_items().len(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_category_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<NewCategoryBody>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    match api.service.add_category(&body.name) {
        Ok(category) => (StatusCode::CREATED, axum::Json(category)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_item_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    axum::Json(new_item): axum::Json<NewItem>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    match api.service.add_item(new_item) {
        Ok(item) => (StatusCode::CREATED, axum::Json(item)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn import_catalog_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    body: String,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    let imported = match CatalogImporter::from_reader(body.as_bytes()) {
        Ok(imported) => imported,
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };
    match api.service.import_catalog(imported) {
        Ok(summary) => {
            let payload = json!({
                "categories_created": summary.categories_created,
                "items_created": summary.items_created,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn edit_item_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    Path(item_id): Path<String>,
    axum::Json(edit): axum::Json<ItemEdit>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    match api.service.edit_item(&ItemId(item_id), edit) {
        Ok(item) => (StatusCode::OK, axum::Json(item)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn toggle_item_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    Path(item_id): Path<String>,
    axum::Json(body): axum::Json<ActiveBody>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    match api.service.set_item_active(&ItemId(item_id.clone()), body.active) {
        Ok(()) => {
            let payload = json!({
                "item_id": item_id,
                "is_active": body.active,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_item_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    Path(item_id): Path<String>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    match api.service.remove_item(&ItemId(item_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_visits_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    Query(query): Query<VisitsQuery>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    let branch = match BranchFilter::from_query(query.branch_id.as_deref()) {
        BranchFilter::All => None,
        BranchFilter::Only(id) => Some(id),
    };
    match api.service.visits(branch.as_ref()) {
        Ok(visits) => (StatusCode::OK, axum::Json(visits)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn open_visit_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    axum::Json(new_visit): axum::Json<NewVisit>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    let context = match api.admin(&headers).await {
        Ok(context) => context,
        Err(denied) => return denied,
    };
    match api.service.open_visit(&context, new_visit) {
        Ok(visit) => (StatusCode::CREATED, axum::Json(visit)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_visit_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    Path(visit_id): Path<String>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    match api.service.remove_visit(&VisitId(visit_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn score_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    Path(visit_id): Path<String>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    let id = VisitId(visit_id);
    match api.service.visit_score(&id) {
        Ok(score) => (StatusCode::OK, axum::Json(score_payload(&id, &score))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn results_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    Path(visit_id): Path<String>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    match api.service.results(&VisitId(visit_id)) {
        Ok(entries) => {
            let payload: Vec<_> = entries
                .iter()
                .map(|entry| {
                    json!({
                        "item_id": entry.item_id,
                        "judgment": entry.judgment,
                        "label": entry.judgment.label(),
                        "score": entry.score,
                    })
                })
                .collect();
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn conforming_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    Path((visit_id, item_id)): Path<(String, String)>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    let visit_id = VisitId(visit_id);
    match api.service.record_conforming(&visit_id, &ItemId(item_id)) {
        Ok(score) => (StatusCode::OK, axum::Json(score_payload(&visit_id, &score))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stage_nonconformity_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    Path((visit_id, item_id)): Path<(String, String)>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    match api
        .service
        .stage_nonconformity(&VisitId(visit_id), &ItemId(item_id))
    {
        Ok(pending) => (StatusCode::ACCEPTED, axum::Json(pending)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn commit_nonconformity_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    Path((visit_id, item_id)): Path<(String, String)>,
    axum::Json(body): axum::Json<ObservationBody>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    let visit_id = VisitId(visit_id);
    match api
        .service
        .commit_nonconformity(&visit_id, &ItemId(item_id), &body.observation)
    {
        Ok(score) => (StatusCode::OK, axum::Json(score_payload(&visit_id, &score))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_nonconformity_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
    Path((visit_id, item_id)): Path<(String, String)>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    if api
        .service
        .cancel_nonconformity(&VisitId(visit_id), &ItemId(item_id))
    {
        StatusCode::NO_CONTENT.into_response()
    } else {
        let payload = json!({
            "error": "no pending observation",
        });
        (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
    }
}

pub(crate) async fn monthly_trend_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    Query(query): Query<TrendQuery>,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    let branch = BranchFilter::from_query(query.branch_id.as_deref());
    match api.service.monthly_trend(query.year, &branch) {
        Ok(points) => (StatusCode::OK, axum::Json(points)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn scale_handler<S, P>(State(_api): State<InspectionApi<S, P>>) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    let scale: Vec<_> = EVALUATION_SCALE
        .iter()
        .map(|(minimum, label)| json!({ "minimum": minimum, "label": label.label() }))
        .collect();
    let reference: Vec<_> = reference_rows()
        .into_iter()
        .map(|row| json!({ "percentage": row.percentage, "label": row.label.map(|l| l.label()) }))
        .collect();
    let payload = json!({
        "scale": scale,
        "reference": reference,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn list_users_handler<S, P>(
    State(api): State<InspectionApi<S, P>>,
    headers: HeaderMap,
) -> Response
where
    S: InspectionStore + 'static,
    P: IdentityProvider + 'static,
{
    if let Err(denied) = api.admin(&headers).await {
        return denied;
    }
    match tokio::time::timeout(api.auth_timeout, list_users(api.identity.as_ref())).await {
        Ok(Ok(users)) => (StatusCode::OK, axum::Json(users)).into_response(),
        Ok(Err(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
        Err(_) => {
            let payload = json!({
                "error": "identity provider timed out",
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}

fn score_payload(visit_id: &VisitId, score: &VisitScore) -> serde_json::Value {
    json!({
        "visit_id": visit_id,
        "total_score": score.total_score,
        "max_possible": score.max_possible,
        "percentage": score.percentage,
        "evaluation": score.evaluation_label(),
        "conforming": score.conforming,
        "non_conforming": score.non_conforming,
        "unjudged": score.unjudged,
    })
}

fn access_response(error: AccessError) -> Response {
    let status = match error {
        AccessError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AccessError::Forbidden { .. } => StatusCode::FORBIDDEN,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

fn error_response(error: InspectionServiceError) -> Response {
    let status = inspection_status(&error);
    let message = match &error {
        InspectionServiceError::Repository(RepositoryError::NotFound) => "not found".to_string(),
        other => other.to_string(),
    };
    let payload = json!({
        "error": message,
    });
    (status, axum::Json(payload)).into_response()
}
