use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::domain::{BranchId, PointValues, ValidationError, Visit, VisitId, Weight};

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row {
        line: usize,
        source: ValidationError,
    },
    InvalidDate {
        line: usize,
        value: String,
    },
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read import file: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid CSV data: {}", err),
            CatalogImportError::Row { line, source } => {
                write!(f, "row {} rejected: {}", line, source)
            }
            CatalogImportError::InvalidDate { line, value } => {
                write!(f, "row {} has an invalid date '{}' (expected YYYY-MM-DD)", line, value)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Row { source, .. } => Some(source),
            CatalogImportError::InvalidDate { .. } => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Checklist row ready to be appended under a category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedItem {
    pub category: String,
    pub description: String,
    pub weight: Weight,
    pub points: Option<PointValues>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedCatalog {
    pub items: Vec<ImportedItem>,
}

impl ImportedCatalog {
    /// Category names in first-seen order, deduplicated case-insensitively.
    pub fn category_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for item in &self.items {
            if !names
                .iter()
                .any(|name| name.eq_ignore_ascii_case(&item.category))
            {
                names.push(item.category.clone());
            }
        }
        names
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub categories_created: usize,
    pub items_created: usize,
}

/// Reads checklist catalogs shaped `category,description,weight[,points_positive,points_negative]`.
pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ImportedCatalog, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<ImportedCatalog, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut items = Vec::new();

        for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            let row = record?;
            // header is line 1
            let line = index + 2;
            items.push(row.into_item().map_err(|source| CatalogImportError::Row { line, source })?);
        }

        Ok(ImportedCatalog { items })
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    category: String,
    description: String,
    weight: u8,
    #[serde(default, deserialize_with = "empty_as_none")]
    points_positive: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    points_negative: Option<i32>,
}

impl CatalogRow {
    fn into_item(self) -> Result<ImportedItem, ValidationError> {
        if self.category.trim().is_empty() {
            return Err(ValidationError::MissingCategory);
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        let weight = Weight::try_from(self.weight)?;
        let points = match (self.points_positive, self.points_negative) {
            (Some(positive), Some(negative)) => {
                let points = PointValues { positive, negative };
                points.validate()?;
                Some(points)
            }
            (None, None) => None,
            _ => return Err(ValidationError::IncompletePoints),
        };

        Ok(ImportedItem {
            category: self.category,
            description: self.description,
            weight,
            points,
        })
    }
}

/// Reads visit ledgers shaped `branch_id,visit_date,total_score,max_possible_score`.
pub struct VisitLedger;

impl VisitLedger {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Visit>, CatalogImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Visit>, CatalogImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut visits = Vec::new();

        for (index, record) in csv_reader.deserialize::<VisitRow>().enumerate() {
            let row = record?;
            let line = index + 2;
            let visit_date = NaiveDate::parse_from_str(&row.visit_date, "%Y-%m-%d").map_err(|_| {
                CatalogImportError::InvalidDate {
                    line,
                    value: row.visit_date.clone(),
                }
            })?;

            visits.push(Visit {
                id: VisitId(format!("ledger-{line}")),
                branch_id: BranchId(row.branch_id),
                visit_date,
                notes: None,
                inspector_id: None,
                total_score: row.total_score,
                max_possible_score: row.max_possible_score,
            });
        }

        Ok(visits)
    }
}

#[derive(Debug, Deserialize)]
struct VisitRow {
    branch_id: String,
    visit_date: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    total_score: Option<i32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    max_possible_score: Option<i32>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
