use std::sync::Arc;

use chrono::NaiveDate;
use food_inspection::workflows::inspection::{
    classify, reference_rows, AccessContext, Actor, ActorId, BranchFilter, EvaluationLabel,
    InspectionService, InspectionStore, Judgment, MemoryInspectionStore, NewBranch, NewItem,
    NewVisit, Role, ScoringConfig, Weight,
};

fn visit_date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).expect("valid visit date")
}

fn inspector() -> AccessContext {
    AccessContext::authenticated(
        Actor {
            id: ActorId::from("nutri-01"),
            display_name: Some("Carla".to_string()),
        },
        [Role::Admin],
    )
}

#[test]
fn evaluation_scale_is_monotonic_across_the_percentage_range() {
    let mut previous = classify(-200);
    for pct in -199..=150 {
        let current = classify(pct);
        assert!(current >= previous, "label regressed at {pct}%");
        previous = current;
    }
    assert_eq!(classify(99), EvaluationLabel::Otimo);
    assert_eq!(classify(100), EvaluationLabel::Excelente);
    assert_eq!(classify(69), EvaluationLabel::Insatisfatorio);

    let labelled: Vec<u8> = reference_rows()
        .into_iter()
        .filter(|row| row.label.is_some())
        .map(|row| row.percentage)
        .collect();
    assert_eq!(labelled, vec![100, 90, 80, 70]);
}

#[test]
fn season_of_visits_rolls_up_into_monthly_trend() {
    let store = MemoryInspectionStore::default();
    let service = InspectionService::new(Arc::new(store.clone()), ScoringConfig::default());

    let branch = service
        .add_branch(NewBranch {
            name: "Unidade Paulista".to_string(),
            responsible: None,
        })
        .expect("branch added");
    let hygiene = service
        .add_category("Higiene das instalações")
        .expect("category added");
    let items: Vec<_> = [
        ("Piso limpo e sem acúmulo de resíduos", Weight::One),
        ("Câmara fria com termômetro calibrado", Weight::Two),
    ]
    .into_iter()
    .map(|(description, weight)| {
        service
            .add_item(NewItem {
                category_id: Some(hygiene.id.clone()),
                description: description.to_string(),
                weight,
                points: None,
            })
            .expect("item added")
    })
    .collect();

    let open = |month, day| {
        service
            .open_visit(
                &inspector(),
                NewVisit {
                    branch_id: branch.id.clone(),
                    visit_date: visit_date(month, day),
                    notes: Some("Visita de rotina".to_string()),
                },
            )
            .expect("visit opened")
    };

    // February: everything conforms
    let february = open(2, 12);
    for item in &items {
        service
            .record_conforming(&february.id, &item.id)
            .expect("judged");
    }

    // May: the cold room fails, twice in the month
    for day in [5, 26] {
        let may = open(5, day);
        service
            .record_conforming(&may.id, &items[0].id)
            .expect("judged");
        service
            .stage_nonconformity(&may.id, &items[1].id)
            .expect("staged");
        service
            .commit_nonconformity(&may.id, &items[1].id, "Termômetro marcando 9 °C")
            .expect("committed");
    }

    let trend = service
        .monthly_trend(Some(2025), &BranchFilter::All)
        .expect("trend computed");
    assert_eq!(trend[1].percentage, Some(100));
    assert_eq!(trend[1].visit_count, 1);
    // each May visit: 50 - 200 = -150 out of 150
    assert_eq!(trend[4].total_score, -300);
    assert_eq!(trend[4].max_possible, 300);
    assert_eq!(trend[4].percentage, Some(-100));
    assert!(trend
        .iter()
        .enumerate()
        .filter(|(index, _)| ![1, 4].contains(index))
        .all(|(_, point)| point.percentage.is_none()));

    let log = service.visit_log(&branch.id).expect("log computed");
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].label, "maio de 2025");
    assert_eq!(log[0].visits.len(), 2);

    let dashboard = service.dashboard(&branch.id).expect("dashboard computed");
    let latest = dashboard.latest_visit.expect("latest visit present");
    assert_eq!(latest.visit_date, visit_date(5, 26));
    assert_eq!(latest.percentage, Some(-100));

    let may_visit = store
        .visits(Some(&branch.id))
        .expect("visits listed")
        .into_iter()
        .next()
        .expect("newest visit first");
    let entries = store.results(&may_visit.id).expect("results listed");
    assert!(entries.iter().any(|entry| matches!(
        &entry.judgment,
        Judgment::NonConforming { observation } if observation.contains("9 °C")
    )));
}
