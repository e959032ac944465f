mod history;
mod monthly;
pub mod views;

pub use history::{branch_dashboard, group_visit_log};
pub use monthly::aggregate_by_month;
pub use views::{
    AttentionLevel, BranchDashboard, BranchFilter, ChartBand, MonthBucket, MonthlyTrendPoint,
    MonthlyVisitGroup, VisitLogEntry,
};
