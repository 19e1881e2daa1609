use crate::collation::sort_by_name;
use crate::query::{plan_search, SearchPlan};
use crate::traits::CompanyStore;
use crate::{Company, CompanySummary, SearchRequest, StoreError};
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Runs search plans and detail lookups against a company store.
#[derive(Clone)]
pub struct CompanyDirectory {
    store: Arc<dyn CompanyStore>,
}

impl CompanyDirectory {
    pub fn new(store: Arc<dyn CompanyStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CompanyStore> {
        &self.store
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<CompanySummary>, StoreError> {
        match plan_search(request) {
            SearchPlan::Listing(query) => self.store.find_companies(&query).await,
            SearchPlan::Intersection(queries) => {
                let lookups = queries
                    .iter()
                    .map(|query| self.store.find_companies(query));
                let match_sets = try_join_all(lookups).await?;

                debug!(
                    keywords = match_sets.len(),
                    sizes = ?match_sets.iter().map(Vec::len).collect::<Vec<_>>(),
                    "intersecting keyword matches"
                );

                let mut hits = intersect_by_id(match_sets);
                sort_by_name(&mut hits, |hit| hit.name.as_str());
                Ok(hits)
            }
        }
    }

    pub async fn company(&self, id: &str) -> Result<Option<Company>, StoreError> {
        self.store.company_by_id(id).await
    }
}

/// Summaries present in every match set, each id once, in first-set order.
pub fn intersect_by_id(match_sets: Vec<Vec<CompanySummary>>) -> Vec<CompanySummary> {
    let mut sets = match_sets.into_iter();
    let Some(first) = sets.next() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut survivors: Vec<CompanySummary> = first
        .into_iter()
        .filter(|hit| seen.insert(hit.id.clone()))
        .collect();

    for set in sets {
        let ids: HashSet<String> = set.into_iter().map(|hit| hit.id).collect();
        survivors.retain(|hit| ids.contains(&hit.id));
        if survivors.is_empty() {
            break;
        }
    }

    survivors
}
