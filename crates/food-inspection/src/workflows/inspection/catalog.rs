use std::collections::HashSet;

use serde::Serialize;

use super::domain::{Category, CategoryId, InspectionItem, ItemId, NewItem, ValidationError};
use super::scoring::ScoringConfig;

/// Snapshot of the checklist: ordered categories and every item, active or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub categories: Vec<Category>,
    pub items: Vec<InspectionItem>,
}

/// A category with its items, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSection {
    pub category: Category,
    pub items: Vec<InspectionItem>,
}

impl Catalog {
    pub fn new(mut categories: Vec<Category>, mut items: Vec<InspectionItem>) -> Self {
        categories.sort_by_key(|category| category.sort_order);
        items.sort_by_key(|item| (item.sort_order, item.question_number));
        Self { categories, items }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category.sort_order) {
                return Err(ValidationError::DuplicateSortOrder(category.sort_order));
            }
        }
        Ok(())
    }

    pub fn active_items(&self) -> Vec<InspectionItem> {
        self.items
            .iter()
            .filter(|item| item.is_active)
            .cloned()
            .collect()
    }

    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| &category.id == id)
    }

    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        let wanted = name.trim();
        self.categories
            .iter()
            .find(|category| category.name.trim().eq_ignore_ascii_case(wanted))
    }

    pub fn item(&self, id: &ItemId) -> Option<&InspectionItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Categories with their items; pass `include_inactive = false` for the judging sheet.
    pub fn sections(&self, include_inactive: bool) -> Vec<CatalogSection> {
        self.categories
            .iter()
            .map(|category| CatalogSection {
                category: category.clone(),
                items: self
                    .items
                    .iter()
                    .filter(|item| item.category_id == category.id)
                    .filter(|item| include_inactive || item.is_active)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    pub fn next_question_number(&self) -> u32 {
        self.items
            .iter()
            .map(|item| item.question_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn next_category_sort_order(&self) -> i32 {
        self.categories
            .iter()
            .map(|category| category.sort_order)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Validate a new item against this snapshot and assign numbering and point values.
    pub fn prepare_item(
        &self,
        id: ItemId,
        new_item: NewItem,
        config: &ScoringConfig,
    ) -> Result<InspectionItem, ValidationError> {
        let description = new_item.description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }

        let category_id = new_item
            .category_id
            .filter(|id| !id.as_str().trim().is_empty())
            .ok_or(ValidationError::MissingCategory)?;
        if self.category(&category_id).is_none() {
            return Err(ValidationError::UnknownCategory(category_id));
        }

        let points = new_item
            .points
            .unwrap_or_else(|| config.points_for(new_item.weight));
        points.validate()?;

        let number = self.next_question_number();
        Ok(InspectionItem {
            id,
            category_id,
            question_number: number,
            description: description.to_string(),
            weight: new_item.weight,
            points_positive: points.positive,
            points_negative: points.negative,
            is_active: true,
            sort_order: i32::try_from(number).unwrap_or(i32::MAX),
        })
    }
}
