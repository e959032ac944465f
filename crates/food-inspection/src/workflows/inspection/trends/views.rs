use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::super::domain::{BranchId, Visit, VisitId};

pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Calendar-month aggregation key. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonthBucket {
    pub year: i32,
    /// 1-based calendar month.
    pub month: u32,
}

impl MonthBucket {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    fn index(self) -> usize {
        (self.month.clamp(1, 12) - 1) as usize
    }

    pub fn label(self) -> &'static str {
        MONTH_ABBREVIATIONS[self.index()]
    }

    pub fn long_label(self) -> String {
        format!("{} de {}", MONTH_NAMES[self.index()], self.year)
    }

    pub fn key(self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BranchFilter {
    #[default]
    All,
    Only(BranchId),
}

impl BranchFilter {
    /// Query-string form: absent, empty or `all` select every branch.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::All,
            Some(raw) if raw.eq_ignore_ascii_case("all") => Self::All,
            Some(raw) => Self::Only(BranchId(raw.to_string())),
        }
    }

    pub fn matches(&self, visit: &Visit) -> bool {
        match self {
            Self::All => true,
            Self::Only(id) => &visit.branch_id == id,
        }
    }
}

/// Colour band for trend bars. Cosmetic; evaluation tiers come from the scoring scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartBand {
    Optimal,
    Satisfactory,
    Regular,
    Insufficient,
}

impl ChartBand {
    pub fn from_percentage(percentage: i32) -> Self {
        if percentage >= 93 {
            Self::Optimal
        } else if percentage >= 80 {
            Self::Satisfactory
        } else if percentage >= 70 {
            Self::Regular
        } else {
            Self::Insufficient
        }
    }

    pub const fn colour(self) -> &'static str {
        match self {
            Self::Optimal => "#22c55e",
            Self::Satisfactory => "#f59e0b",
            Self::Regular => "#f97316",
            Self::Insufficient => "#ef4444",
        }
    }

    pub const fn legend(self) -> &'static str {
        match self {
            Self::Optimal => "≥93% Ótimo/Excelente",
            Self::Satisfactory => "80-92% Satisfatório",
            Self::Regular => "70-79% Regular",
            Self::Insufficient => "<70% Insuficiente",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTrendPoint {
    pub bucket: MonthBucket,
    pub month: &'static str,
    /// `None` when the bucket holds no visits or nothing to score against.
    pub percentage: Option<i32>,
    pub visit_count: usize,
    pub total_score: i64,
    pub max_possible: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<ChartBand>,
    /// Bar colour for `band`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionLevel {
    Good,
    Attention,
}

impl AttentionLevel {
    pub fn from_percentage(percentage: i32) -> Self {
        if percentage >= 70 {
            Self::Good
        } else {
            Self::Attention
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "Bom",
            Self::Attention => "Atenção",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitLogEntry {
    pub visit_id: VisitId,
    pub branch_id: BranchId,
    pub visit_date: NaiveDate,
    pub total_score: Option<i32>,
    pub max_possible_score: Option<i32>,
    pub percentage: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attention: Option<AttentionLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&Visit> for VisitLogEntry {
    fn from(visit: &Visit) -> Self {
        let percentage = visit.percentage();
        Self {
            visit_id: visit.id.clone(),
            branch_id: visit.branch_id.clone(),
            visit_date: visit.visit_date,
            total_score: visit.total_score,
            max_possible_score: visit.max_possible_score,
            percentage,
            attention: percentage.map(AttentionLevel::from_percentage),
            notes: visit.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyVisitGroup {
    pub bucket: MonthBucket,
    pub label: String,
    pub visits: Vec<VisitLogEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchDashboard {
    pub branch_id: BranchId,
    pub latest_visit: Option<VisitLogEntry>,
    pub visit_count: usize,
    pub recent_visits: Vec<VisitLogEntry>,
}
