use crate::infra::{seeded_service, LocalInspectionService};
use chrono::{Datelike, Days, Local, Months, NaiveDate};
use clap::Args;
use food_inspection::config::AppConfig;
use food_inspection::error::AppError;
use food_inspection::workflows::inspection::{
    aggregate_by_month, reference_rows, AccessContext, Actor, ActorId, Branch, BranchDashboard,
    BranchFilter, Catalog, MonthlyTrendPoint, NewBranch, NewVisit, Role, VisitId, VisitLedger,
    VisitScore,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct TrendArgs {
    /// Visit ledger CSV: branch_id,visit_date,total_score,max_possible_score
    #[arg(long)]
    pub(crate) visits: PathBuf,
    /// Restrict to one calendar year and list all twelve months
    #[arg(long, value_parser = crate::infra::parse_year)]
    pub(crate) year: Option<i32>,
    /// Restrict to one branch id (`all` for every branch)
    #[arg(long)]
    pub(crate) branch: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct CatalogImportArgs {
    /// Catalog CSV: category,description,weight[,points_positive,points_negative]
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Date of the first simulated visit, YYYY-MM-DD (defaults to January of the current year)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Catalog CSV to judge against (defaults to the bundled starter checklist)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

pub(crate) fn run_trend(args: TrendArgs) -> Result<(), AppError> {
    let TrendArgs {
        visits,
        year,
        branch,
    } = args;

    let ledger = VisitLedger::from_path(&visits)?;
    let filter = BranchFilter::from_query(branch.as_deref());
    let points = aggregate_by_month(&ledger, year, &filter);

    println!(
        "Monthly conformity trend ({} visits from {})",
        ledger.len(),
        visits.display()
    );
    render_trend(&points);
    Ok(())
}

pub(crate) fn run_catalog_import(args: CatalogImportArgs) -> Result<(), AppError> {
    let scoring = AppConfig::load()?.scoring;
    let service = seeded_service(scoring, Some(args.csv.as_path()))?;
    let catalog = service.catalog()?;

    println!(
        "Checklist imported from {} ({} categories, {} items)",
        args.csv.display(),
        catalog.categories.len(),
        catalog.items.len()
    );
    render_catalog(&catalog);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let start = match args.start {
        Some(start) => start,
        None => NaiveDate::from_ymd_opt(Local::now().date_naive().year(), 1, 10)
            .unwrap_or_default(),
    };
    let service = seeded_service(AppConfig::load()?.scoring, args.catalog.as_deref())?;
    let inspector = AccessContext::authenticated(
        Actor {
            id: ActorId::from("demo-inspector"),
            display_name: Some("Nutricionista responsável".to_string()),
        },
        [Role::Admin, Role::Employee],
    );

    println!("Food-safety inspection demo (from {})", start.format("%d/%m/%Y"));
    let catalog = service.catalog()?;
    render_catalog(&catalog);

    let branches = ["Unidade Centro", "Unidade Norte"]
        .into_iter()
        .map(|name| {
            service.add_branch(NewBranch {
                name: name.to_string(),
                responsible: Some("Gerente de turno".to_string()),
            })
        })
        .collect::<Result<Vec<Branch>, _>>()?;

    println!("\nVisits");
    for (branch_index, branch) in branches.iter().enumerate() {
        for month in 0..6u32 {
            let Some(visit_date) = start
                .checked_add_months(Months::new(month))
                .and_then(|date| date.checked_add_days(Days::new(branch_index as u64)))
            else {
                continue;
            };
            let visit = service.open_visit(
                &inspector,
                NewVisit {
                    branch_id: branch.id.clone(),
                    visit_date,
                    notes: None,
                },
            )?;
            let score = judge_visit(&service, &catalog, &visit.id, branch_index, month)?;
            render_visit(branch, visit_date, &score);
        }
    }

    println!("\nMonthly trend (all branches)");
    render_trend(&service.monthly_trend(None, &BranchFilter::All)?);

    for branch in &branches {
        println!("\nDashboard: {}", branch.name);
        render_dashboard(&service.dashboard(&branch.id)?);
    }

    println!("\nEvaluation scale");
    for row in reference_rows() {
        println!(
            "  {:>3}% {}",
            row.percentage,
            row.label.map(|label| label.label()).unwrap_or("")
        );
    }

    Ok(())
}

/// Deterministic judging pattern so the demo output is reproducible.
fn judge_visit(
    service: &LocalInspectionService,
    catalog: &Catalog,
    visit_id: &VisitId,
    branch_index: usize,
    month: u32,
) -> Result<VisitScore, AppError> {
    let mut score = service.visit_score(visit_id)?;
    for (item_index, item) in catalog.active_items().iter().enumerate() {
        let fails = (item_index + branch_index * 3 + month as usize) % 7 == 0;
        score = if fails {
            service.stage_nonconformity(visit_id, &item.id)?;
            service.commit_nonconformity(
                visit_id,
                &item.id,
                &format!("Item {} não atendido na visita", item.question_number),
            )?
        } else {
            service.record_conforming(visit_id, &item.id)?
        };
    }
    Ok(score)
}

fn render_catalog(catalog: &Catalog) {
    for section in catalog.sections(true) {
        println!("{}", section.category.name);
        for item in &section.items {
            println!(
                "  {:>2}. {} (peso {}, +{} / {}){}",
                item.question_number,
                item.description,
                item.weight.value(),
                item.points_positive,
                item.points_negative,
                if item.is_active { "" } else { " [inativo]" }
            );
        }
    }
}

fn render_visit(branch: &Branch, visit_date: NaiveDate, score: &VisitScore) {
    println!(
        "- {} {} | {} / {} pts | {} | {} conformes, {} não conformes",
        branch.name,
        visit_date.format("%d/%m/%Y"),
        score.total_score,
        score.max_possible,
        format_percentage(score.percentage),
        score.conforming,
        score.non_conforming
    );
    println!("  avaliação: {}", score.evaluation_label());
}

fn render_trend(points: &[MonthlyTrendPoint]) {
    for point in points {
        let band = point
            .band
            .map(|band| format!(" ({})", band.legend()))
            .unwrap_or_default();
        println!(
            "  {} {} | {} | {} visit(s){}",
            point.month,
            point.bucket.year,
            format_percentage(point.percentage),
            point.visit_count,
            band
        );
    }
}

fn render_dashboard(dashboard: &BranchDashboard) {
    match &dashboard.latest_visit {
        Some(latest) => {
            let status = latest
                .attention
                .map(|level| level.label())
                .unwrap_or("Sem dados");
            println!(
                "  última visita {} | {} | status {}",
                latest.visit_date.format("%d/%m/%Y"),
                format_percentage(latest.percentage),
                status
            );
        }
        None => println!("  nenhuma visita registrada"),
    }
    println!("  {} visita(s) no total", dashboard.visit_count);
    for visit in dashboard.recent_visits.iter().skip(1) {
        println!(
            "  - {} {}",
            visit.visit_date.format("%d/%m/%Y"),
            format_percentage(visit.percentage)
        );
    }
}

fn format_percentage(percentage: Option<i32>) -> String {
    percentage.map_or_else(|| "sem dados".to_string(), |pct| format!("{pct}%"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_judging_pattern_scores_every_active_item() {
        let service = seeded_service(Default::default(), None).expect("service seeded");
        let catalog = service.catalog().expect("catalog");
        let branch = service
            .add_branch(NewBranch {
                name: "Teste".to_string(),
                responsible: None,
            })
            .expect("branch added");
        let inspector = AccessContext::authenticated(
            Actor {
                id: ActorId::from("tester"),
                display_name: None,
            },
            [Role::Admin],
        );
        let visit = service
            .open_visit(
                &inspector,
                NewVisit {
                    branch_id: branch.id,
                    visit_date: NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date"),
                    notes: None,
                },
            )
            .expect("visit opened");

        let score = judge_visit(&service, &catalog, &visit.id, 0, 1).expect("judged");

        assert_eq!(score.unjudged, 0);
        assert_eq!(
            score.conforming + score.non_conforming,
            catalog.active_items().len()
        );
        assert!(score.non_conforming > 0);
    }

    #[test]
    fn percentages_render_no_data_explicitly() {
        assert_eq!(format_percentage(None), "sem dados");
        assert_eq!(format_percentage(Some(-50)), "-50%");
    }
}
