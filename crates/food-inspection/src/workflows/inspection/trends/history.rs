use std::collections::BTreeMap;

use super::super::domain::{BranchId, Visit};
use super::views::{BranchDashboard, MonthBucket, MonthlyVisitGroup, VisitLogEntry};

const RECENT_VISITS: usize = 5;

/// Visit log grouped by month, newest month first and newest visit first within a month.
pub fn group_visit_log(visits: &[Visit]) -> Vec<MonthlyVisitGroup> {
    let mut groups: BTreeMap<MonthBucket, Vec<&Visit>> = BTreeMap::new();
    for visit in visits {
        groups
            .entry(MonthBucket::from_date(visit.visit_date))
            .or_default()
            .push(visit);
    }

    groups
        .into_iter()
        .rev()
        .map(|(bucket, mut month_visits)| {
            month_visits.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));
            MonthlyVisitGroup {
                bucket,
                label: bucket.long_label(),
                visits: month_visits.into_iter().map(VisitLogEntry::from).collect(),
            }
        })
        .collect()
}

/// Latest-visit summary for one branch.
pub fn branch_dashboard(branch_id: &BranchId, visits: &[Visit]) -> BranchDashboard {
    let mut own: Vec<&Visit> = visits
        .iter()
        .filter(|visit| &visit.branch_id == branch_id)
        .collect();
    own.sort_by(|a, b| b.visit_date.cmp(&a.visit_date));

    let recent_visits: Vec<VisitLogEntry> = own
        .iter()
        .take(RECENT_VISITS)
        .map(|visit| VisitLogEntry::from(*visit))
        .collect();

    BranchDashboard {
        branch_id: branch_id.clone(),
        latest_visit: recent_visits.first().cloned(),
        visit_count: own.len(),
        recent_visits,
    }
}
