use chrono::NaiveDate;
use food_inspection::error::AppError;
use food_inspection::workflows::inspection::{
    Actor, ActorDirectory, ActorId, CatalogImporter, InspectionService, MemoryInspectionStore,
    Role, ScoringConfig,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Checklist bundled with the binary, used when no catalog file is given.
pub(crate) const STARTER_CATALOG: &str = include_str!("../catalog/starter.csv");

pub(crate) type LocalInspectionService = InspectionService<MemoryInspectionStore>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory service seeded with a checklist catalog.
pub(crate) fn seeded_service(
    scoring: ScoringConfig,
    catalog: Option<&Path>,
) -> Result<Arc<LocalInspectionService>, AppError> {
    let imported = match catalog {
        Some(path) => CatalogImporter::from_path(path)?,
        None => CatalogImporter::from_reader(STARTER_CATALOG.as_bytes())?,
    };

    let service = InspectionService::new(Arc::new(MemoryInspectionStore::default()), scoring);
    let summary = service.import_catalog(imported)?;
    info!(
        categories = summary.categories_created,
        items = summary.items_created,
        source = catalog.map_or("starter".to_string(), |path| path.display().to_string()),
        "checklist seeded"
    );
    Ok(Arc::new(service))
}

pub(crate) fn local_directory(admin_token: &str, employee_token: Option<&str>) -> ActorDirectory {
    let directory = ActorDirectory::default().with_actor(
        admin_token,
        Actor {
            id: ActorId::from("local-admin"),
            display_name: Some("Administrador".to_string()),
        },
        [Role::Admin, Role::Employee],
    );

    match employee_token {
        Some(token) => directory.with_actor(
            token,
            Actor {
                id: ActorId::from("local-employee"),
                display_name: Some("Funcionário".to_string()),
            },
            [Role::Employee],
        ),
        None => directory,
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_year(raw: &str) -> Result<i32, String> {
    match raw.trim().parse::<i32>() {
        Ok(year) if (1900..=9999).contains(&year) => Ok(year),
        _ => Err(format!("'{raw}' is not a four-digit year")),
    }
}
