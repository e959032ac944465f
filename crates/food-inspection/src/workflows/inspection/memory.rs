use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    Branch, BranchId, Category, CategoryId, InspectionItem, ItemId, ResultEntry, Visit, VisitId,
};
use super::repository::{InspectionStore, RepositoryError};

#[derive(Debug, Default)]
struct Tables {
    branches: HashMap<BranchId, Branch>,
    categories: HashMap<CategoryId, Category>,
    items: HashMap<ItemId, InspectionItem>,
    visits: HashMap<VisitId, Visit>,
    results: BTreeMap<(VisitId, ItemId), ResultEntry>,
}

/// Process-local store used by the CLI, the demo server and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryInspectionStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryInspectionStore {
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    #[cfg(test)]
    pub(crate) fn result_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.results.len())
    }
}

impl InspectionStore for MemoryInspectionStore {
    fn branches(&self) -> Result<Vec<Branch>, RepositoryError> {
        let tables = self.lock()?;
        let mut branches: Vec<Branch> = tables.branches.values().cloned().collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(branches)
    }

    fn insert_branch(&self, branch: Branch) -> Result<Branch, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.branches.contains_key(&branch.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.branches.insert(branch.id.clone(), branch.clone());
        Ok(branch)
    }

    fn delete_branch(&self, id: &BranchId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if tables.branches.remove(id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        let orphaned: Vec<VisitId> = tables
            .visits
            .values()
            .filter(|visit| &visit.branch_id == id)
            .map(|visit| visit.id.clone())
            .collect();
        for visit_id in &orphaned {
            tables.visits.remove(visit_id);
        }
        tables
            .results
            .retain(|(visit_id, _), _| !orphaned.contains(visit_id));
        Ok(())
    }

    fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.lock()?;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by_key(|category| category.sort_order);
        Ok(categories)
    }

    fn insert_category(&self, category: Category) -> Result<Category, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.categories.contains_key(&category.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .categories
            .insert(category.id.clone(), category.clone());
        Ok(category)
    }

    fn items(&self) -> Result<Vec<InspectionItem>, RepositoryError> {
        let tables = self.lock()?;
        let mut items: Vec<InspectionItem> = tables.items.values().cloned().collect();
        items.sort_by_key(|item| (item.sort_order, item.question_number));
        Ok(items)
    }

    fn active_items(&self) -> Result<Vec<InspectionItem>, RepositoryError> {
        Ok(self
            .items()?
            .into_iter()
            .filter(|item| item.is_active)
            .collect())
    }

    fn insert_item(&self, item: InspectionItem) -> Result<InspectionItem, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.items.contains_key(&item.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.items.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    fn update_item(&self, item: InspectionItem) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        match tables.items.get_mut(&item.id) {
            Some(stored) => {
                *stored = item;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn set_item_active(&self, id: &ItemId, active: bool) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let item = tables.items.get_mut(id).ok_or(RepositoryError::NotFound)?;
        item.is_active = active;
        Ok(())
    }

    fn delete_item(&self, id: &ItemId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        // judged entries for the item keep their frozen scores
        tables
            .items
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn visits(&self, branch: Option<&BranchId>) -> Result<Vec<Visit>, RepositoryError> {
        let tables = self.lock()?;
        let mut visits: Vec<Visit> = tables
            .visits
            .values()
            .filter(|visit| branch.map_or(true, |id| &visit.branch_id == id))
            .cloned()
            .collect();
        visits.sort_by(|a, b| b.visit_date.cmp(&a.visit_date).then_with(|| b.id.cmp(&a.id)));
        Ok(visits)
    }

    fn visit(&self, id: &VisitId) -> Result<Option<Visit>, RepositoryError> {
        Ok(self.lock()?.visits.get(id).cloned())
    }

    fn insert_visit(&self, visit: Visit) -> Result<Visit, RepositoryError> {
        let mut tables = self.lock()?;
        if tables.visits.contains_key(&visit.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.visits.insert(visit.id.clone(), visit.clone());
        Ok(visit)
    }

    fn update_visit_scores(
        &self,
        id: &VisitId,
        total_score: i32,
        max_possible_score: i32,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        let visit = tables.visits.get_mut(id).ok_or(RepositoryError::NotFound)?;
        visit.total_score = Some(total_score);
        visit.max_possible_score = Some(max_possible_score);
        Ok(())
    }

    fn delete_visit(&self, id: &VisitId) -> Result<(), RepositoryError> {
        let mut tables = self.lock()?;
        if tables.visits.remove(id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        tables.results.retain(|(visit_id, _), _| visit_id != id);
        Ok(())
    }

    fn results(&self, visit: &VisitId) -> Result<Vec<ResultEntry>, RepositoryError> {
        let tables = self.lock()?;
        Ok(tables
            .results
            .iter()
            .filter(|((visit_id, _), _)| visit_id == visit)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    fn upsert_result(&self, entry: ResultEntry) -> Result<ResultEntry, RepositoryError> {
        let mut tables = self.lock()?;
        if !tables.visits.contains_key(&entry.visit_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.results.insert(
            (entry.visit_id.clone(), entry.item_id.clone()),
            entry.clone(),
        );
        Ok(entry)
    }
}
