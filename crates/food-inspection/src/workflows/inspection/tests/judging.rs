use super::common::*;

use crate::workflows::inspection::domain::{Judgment, ValidationError, VisitId};
use crate::workflows::inspection::judging::OBSERVATION_MAX_CHARS;
use crate::workflows::inspection::repository::{InspectionStore, RepositoryError};
use crate::workflows::inspection::scoring::ScoringConfig;
use crate::workflows::inspection::service::{InspectionService, InspectionServiceError};
use std::sync::Arc;

#[test]
fn rejudging_round_trip_leaves_one_clean_conforming_entry() {
    let (service, store) = build_service();
    let checklist = seed_checklist(&service);
    let visit = open_visit(&service, &checklist.branch.id, date(2025, 6, 3));
    let item = &checklist.items[0];

    service.record_conforming(&visit.id, &item.id).expect("conforming");
    service.stage_nonconformity(&visit.id, &item.id).expect("staged");
    service
        .commit_nonconformity(&visit.id, &item.id, "Luvas ausentes")
        .expect("non-conforming");
    service.stage_nonconformity(&visit.id, &item.id).expect("staged again");
    service.record_conforming(&visit.id, &item.id).expect("conforming again");

    let entries = store.results(&visit.id).expect("results");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].judgment, Judgment::Conforming);
    assert_eq!(entries[0].judgment.observation(), None);
    assert_eq!(entries[0].score, Some(50));
    assert!(!service.is_staged(&visit.id, &item.id));
}

#[test]
fn committing_without_a_staged_draft_is_rejected() {
    let (service, store) = build_service();
    let checklist = seed_checklist(&service);
    let visit = open_visit(&service, &checklist.branch.id, date(2025, 6, 3));
    let item = &checklist.items[0];

    let error = service
        .commit_nonconformity(&visit.id, &item.id, "Sem touca")
        .expect_err("nothing staged");

    assert!(matches!(
        error,
        InspectionServiceError::Validation(ValidationError::NothingStaged { .. })
    ));
    assert_eq!(store.result_count().expect("count"), 0);
}

#[test]
fn staging_seeds_the_draft_with_the_stored_observation() {
    let (service, _) = build_service();
    let checklist = seed_checklist(&service);
    let visit = open_visit(&service, &checklist.branch.id, date(2025, 6, 3));
    let item = &checklist.items[1];

    let first = service.stage_nonconformity(&visit.id, &item.id).expect("staged");
    assert_eq!(first.draft, "");
    service
        .commit_nonconformity(&visit.id, &item.id, "Pia sem sabonete")
        .expect("committed");

    let pending = service.stage_nonconformity(&visit.id, &item.id).expect("staged");
    assert_eq!(pending.draft, "Pia sem sabonete");
    assert!(service.is_staged(&visit.id, &item.id));
}

#[test]
fn cancelling_a_draft_stores_nothing() {
    let (service, store) = build_service();
    let checklist = seed_checklist(&service);
    let visit = open_visit(&service, &checklist.branch.id, date(2025, 6, 3));
    let item = &checklist.items[0];

    service.stage_nonconformity(&visit.id, &item.id).expect("staged");
    assert!(service.cancel_nonconformity(&visit.id, &item.id));
    assert!(!service.cancel_nonconformity(&visit.id, &item.id));
    assert!(store.results(&visit.id).expect("results").is_empty());
}

#[test]
fn long_observations_are_truncated() {
    let (service, store) = build_service();
    let checklist = seed_checklist(&service);
    let visit = open_visit(&service, &checklist.branch.id, date(2025, 6, 3));
    let item = &checklist.items[0];
    let text = "ç".repeat(OBSERVATION_MAX_CHARS + 200);

    service.stage_nonconformity(&visit.id, &item.id).expect("staged");
    service
        .commit_nonconformity(&visit.id, &item.id, &text)
        .expect("committed");

    let entries = store.results(&visit.id).expect("results");
    let observation = entries[0].judgment.observation().expect("observation kept");
    assert_eq!(observation.chars().count(), OBSERVATION_MAX_CHARS);
}

#[test]
fn empty_observations_are_accepted() {
    let (service, store) = build_service();
    let checklist = seed_checklist(&service);
    let visit = open_visit(&service, &checklist.branch.id, date(2025, 6, 3));
    let item = &checklist.items[0];

    service.stage_nonconformity(&visit.id, &item.id).expect("staged");
    let score = service
        .commit_nonconformity(&visit.id, &item.id, "")
        .expect("committed");

    assert_eq!(score.total_score, -100);
    assert_eq!(
        store.results(&visit.id).expect("results")[0].judgment.observation(),
        Some("")
    );
}

#[test]
fn inactive_items_cannot_be_judged() {
    let (service, _) = build_service();
    let checklist = seed_checklist(&service);
    let visit = open_visit(&service, &checklist.branch.id, date(2025, 6, 3));
    let item = &checklist.items[0];
    service.set_item_active(&item.id, false).expect("deactivated");

    let error = service
        .record_conforming(&visit.id, &item.id)
        .expect_err("inactive item");
    assert!(matches!(
        error,
        InspectionServiceError::Validation(ValidationError::InactiveItem(_))
    ));
}

#[test]
fn judging_unknown_visits_reports_not_found() {
    let (service, _) = build_service();
    let checklist = seed_checklist(&service);

    let error = service
        .record_conforming(&VisitId::from("visit-missing"), &checklist.items[0].id)
        .expect_err("unknown visit");
    assert!(matches!(
        error,
        InspectionServiceError::Repository(RepositoryError::NotFound)
    ));
}

#[test]
fn removing_a_visit_drops_results_and_drafts() {
    let (service, store) = build_service();
    let checklist = seed_checklist(&service);
    let visit = open_visit(&service, &checklist.branch.id, date(2025, 6, 3));
    let (first, second) = (&checklist.items[0], &checklist.items[1]);

    service.record_conforming(&visit.id, &first.id).expect("judged");
    service.stage_nonconformity(&visit.id, &second.id).expect("staged");
    service.remove_visit(&visit.id).expect("removed");

    assert_eq!(store.result_count().expect("count"), 0);
    assert!(!service.is_staged(&visit.id, &second.id));
    assert_eq!(store.visit(&visit.id).expect("readable"), None);
}

#[test]
fn failed_commit_keeps_the_draft_for_a_retry() {
    let store = FlakyResultStore::default();
    let service = InspectionService::new(Arc::new(store.clone()), ScoringConfig::default());
    let checklist = seed_checklist(&service);
    let visit = open_visit(&service, &checklist.branch.id, date(2025, 6, 3));
    let item = &checklist.items[0];

    service.stage_nonconformity(&visit.id, &item.id).expect("staged");
    store.set_writes_down(true);
    let error = service
        .commit_nonconformity(&visit.id, &item.id, "Lixeira sem tampa")
        .expect_err("write fails");
    assert!(matches!(
        error,
        InspectionServiceError::Repository(RepositoryError::Unavailable(_))
    ));
    assert!(service.is_staged(&visit.id, &item.id));
    assert!(store.results(&visit.id).expect("results").is_empty());

    store.set_writes_down(false);
    let score = service
        .commit_nonconformity(&visit.id, &item.id, "Lixeira sem tampa")
        .expect("retry succeeds");
    assert_eq!(score.total_score, -100);
    assert!(!service.is_staged(&visit.id, &item.id));
}

#[test]
fn failed_conforming_write_keeps_the_staged_draft() {
    let store = FlakyResultStore::default();
    let service = InspectionService::new(Arc::new(store.clone()), ScoringConfig::default());
    let checklist = seed_checklist(&service);
    let visit = open_visit(&service, &checklist.branch.id, date(2025, 6, 3));
    let item = &checklist.items[1];

    service.stage_nonconformity(&visit.id, &item.id).expect("staged");
    store.set_writes_down(true);
    service
        .record_conforming(&visit.id, &item.id)
        .expect_err("write fails");

    assert!(service.is_staged(&visit.id, &item.id));
}
