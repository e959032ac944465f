use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::scoring;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a restaurant branch.
    BranchId
);
string_id!(CategoryId);
string_id!(ItemId);
string_id!(
    /// Identifier of a single inspection visit.
    VisitId
);
string_id!(ActorId);

/// Scoring tier of a checklist item. Descriptive only: the stored point values win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Weight {
    One,
    Two,
}

impl Weight {
    pub const fn value(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl TryFrom<u8> for Weight {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(ValidationError::InvalidWeight(other)),
        }
    }
}

impl From<Weight> for u8 {
    fn from(value: Weight) -> Self {
        value.value()
    }
}

/// Points awarded for a conforming judgment and deducted for a non-conforming one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointValues {
    pub positive: i32,
    pub negative: i32,
}

impl PointValues {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.positive < 0 {
            return Err(ValidationError::NegativePositivePoints(self.positive));
        }
        if self.negative > 0 {
            return Err(ValidationError::PositiveNegativePoints(self.negative));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionItem {
    pub id: ItemId,
    pub category_id: CategoryId,
    pub question_number: u32,
    pub description: String,
    pub weight: Weight,
    pub points_positive: i32,
    pub points_negative: i32,
    pub is_active: bool,
    pub sort_order: i32,
}

impl InspectionItem {
    pub fn points(&self) -> PointValues {
        PointValues {
            positive: self.points_positive,
            negative: self.points_negative,
        }
    }

    /// Score an entry for this item would carry under the given judgment.
    pub fn score_for(&self, judgment: &Judgment) -> Option<i32> {
        match judgment {
            Judgment::Unjudged => None,
            Judgment::Conforming => Some(self.points_positive),
            Judgment::NonConforming { .. } => Some(self.points_negative),
        }
    }
}

/// One inspection event for a branch on a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub branch_id: BranchId,
    pub visit_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspector_id: Option<ActorId>,
    pub total_score: Option<i32>,
    pub max_possible_score: Option<i32>,
}

impl Visit {
    /// Conformity percentage from the stored totals; `None` when nothing can be derived.
    pub fn percentage(&self) -> Option<i32> {
        scoring::percentage(
            i64::from(self.total_score.unwrap_or(0)),
            i64::from(self.max_possible_score.unwrap_or(0)),
        )
    }
}

/// Judgment recorded for one checklist item within a visit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Judgment {
    #[default]
    Unjudged,
    Conforming,
    NonConforming {
        observation: String,
    },
}

impl Judgment {
    pub fn is_conforming(&self) -> Option<bool> {
        match self {
            Self::Unjudged => None,
            Self::Conforming => Some(true),
            Self::NonConforming { .. } => Some(false),
        }
    }

    pub fn observation(&self) -> Option<&str> {
        match self {
            Self::NonConforming { observation } => Some(observation.as_str()),
            _ => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unjudged => "Pendente",
            Self::Conforming => "Conforme",
            Self::NonConforming { .. } => "Não Conforme",
        }
    }
}

/// Stored judgment for a `(visit, item)` pair. The score is frozen at judgment time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub visit_id: VisitId,
    pub item_id: ItemId,
    pub judgment: Judgment,
    pub score: Option<i32>,
}

impl ResultEntry {
    pub fn judged(visit_id: VisitId, item: &InspectionItem, judgment: Judgment) -> Self {
        let score = item.score_for(&judgment);
        Self {
            visit_id,
            item_id: item.id.clone(),
            judgment,
            score,
        }
    }

    pub fn contribution(&self) -> i64 {
        i64::from(self.score.unwrap_or(0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBranch {
    pub name: String,
    #[serde(default)]
    pub responsible: Option<String>,
}

impl NewBranch {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingBranchName);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVisit {
    pub branch_id: BranchId,
    pub visit_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub description: String,
    pub weight: Weight,
    /// Explicit point values; the configured defaults for the weight apply when absent.
    #[serde(default)]
    pub points: Option<PointValues>,
}

/// Partial edit of a checklist item. Changing the weight without explicit points resets
/// the points to the configured defaults for the new weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemEdit {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub weight: Option<Weight>,
    #[serde(default)]
    pub points: Option<PointValues>,
}

/// Input rejected before any persistence call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("branch name is required")]
    MissingBranchName,
    #[error("category name is required")]
    MissingCategoryName,
    #[error("item description is required")]
    MissingDescription,
    #[error("a category must be selected")]
    MissingCategory,
    #[error("unknown category '{0}'")]
    UnknownCategory(CategoryId),
    #[error("unknown branch '{0}'")]
    UnknownBranch(BranchId),
    #[error("item '{0}' is not active")]
    InactiveItem(ItemId),
    #[error("weight must be 1 or 2, got {0}")]
    InvalidWeight(u8),
    #[error("positive points must be >= 0, got {0}")]
    NegativePositivePoints(i32),
    #[error("negative points must be <= 0, got {0}")]
    PositiveNegativePoints(i32),
    #[error("positive and negative points must be given together")]
    IncompletePoints,
    #[error("category sort order {0} is used more than once")]
    DuplicateSortOrder(i32),
    #[error("no pending observation for item '{item_id}' on visit '{visit_id}'")]
    NothingStaged { visit_id: VisitId, item_id: ItemId },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(positive: i32, negative: i32) -> InspectionItem {
        InspectionItem {
            id: ItemId::from("item-1"),
            category_id: CategoryId::from("cat-1"),
            question_number: 1,
            description: "Uniformes limpos".to_string(),
            weight: Weight::One,
            points_positive: positive,
            points_negative: negative,
            is_active: true,
            sort_order: 1,
        }
    }

    #[test]
    fn judged_entries_freeze_item_points() {
        let item = item(70, -30);
        let visit = VisitId::from("visit-1");

        let ok = ResultEntry::judged(visit.clone(), &item, Judgment::Conforming);
        let bad = ResultEntry::judged(
            visit.clone(),
            &item,
            Judgment::NonConforming {
                observation: "Avental sujo".to_string(),
            },
        );
        let pending = ResultEntry::judged(visit, &item, Judgment::Unjudged);

        assert_eq!(ok.score, Some(70));
        assert_eq!(bad.score, Some(-30));
        assert_eq!(pending.score, None);
        assert_eq!(pending.contribution(), 0);
    }

    #[test]
    fn weight_rejects_unknown_tiers() {
        assert_eq!(Weight::try_from(2), Ok(Weight::Two));
        assert_eq!(Weight::try_from(3), Err(ValidationError::InvalidWeight(3)));
        let parsed: Result<Weight, _> = serde_json::from_str("5");
        assert!(parsed.is_err());
    }

    #[test]
    fn point_values_enforce_signs() {
        assert!(PointValues { positive: 0, negative: 0 }.validate().is_ok());
        assert_eq!(
            PointValues { positive: -1, negative: -100 }.validate(),
            Err(ValidationError::NegativePositivePoints(-1))
        );
        assert_eq!(
            PointValues { positive: 50, negative: 10 }.validate(),
            Err(ValidationError::PositiveNegativePoints(10))
        );
    }

    #[test]
    fn visit_percentage_treats_missing_totals_as_no_data() {
        let visit = Visit {
            id: VisitId::from("visit-1"),
            branch_id: BranchId::from("branch-1"),
            visit_date: NaiveDate::from_ymd_opt(2025, 3, 4).expect("valid date"),
            notes: None,
            inspector_id: None,
            total_score: None,
            max_possible_score: None,
        };
        assert_eq!(visit.percentage(), None);
    }

    #[test]
    fn judgment_serializes_with_state_tag() {
        let json = serde_json::to_value(Judgment::NonConforming {
            observation: "Lixeira sem tampa".to_string(),
        })
        .expect("serialize");
        assert_eq!(json["state"], "non_conforming");
        assert_eq!(json["observation"], "Lixeira sem tampa");
    }
}
