use crate::collation::sort_by_name;
use crate::query::{CompanyFilter, CompanyQuery, KeywordMatch};
use crate::traits::CompanyStore;
use crate::{Company, CompanySummary, NewCompany, StoreError};
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::debug;

const STOP_WORDS: [&str; 24] = [
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "into", "is", "it",
    "of", "on", "or", "that", "the", "their", "to", "was", "with", "we",
];

/// Process-local company collection with the same query semantics as the
/// MongoDB store. Used for seeded runs and tests.
#[derive(Default)]
pub struct MemoryCompanyStore {
    companies: RwLock<Vec<Company>>,
}

impl MemoryCompanyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_companies(companies: Vec<Company>) -> Self {
        Self {
            companies: RwLock::new(companies),
        }
    }

    pub async fn len(&self) -> usize {
        self.companies.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.companies.read().await.is_empty()
    }
}

#[async_trait]
impl CompanyStore for MemoryCompanyStore {
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_companies(
        &self,
        query: &CompanyQuery,
    ) -> Result<Vec<CompanySummary>, StoreError> {
        let companies = self.companies.read().await;
        let mut hits: Vec<CompanySummary> = companies
            .iter()
            .filter(|company| matches_filter(company, &query.filter))
            .map(CompanySummary::from)
            .collect();

        if query.sort_by_name {
            sort_by_name(&mut hits, |hit| hit.name.as_str());
        }

        debug!(hits = hits.len(), sorted = query.sort_by_name, "memory find");
        Ok(hits)
    }

    async fn company_by_id(&self, id: &str) -> Result<Option<Company>, StoreError> {
        let companies = self.companies.read().await;
        Ok(companies.iter().find(|company| company.id == id).cloned())
    }

    async fn upsert_company(&self, company: &NewCompany) -> Result<String, StoreError> {
        let mut companies = self.companies.write().await;

        if let Some(existing) = companies
            .iter_mut()
            .find(|existing| existing.name == company.name)
        {
            let id = existing.id.clone();
            *existing = company.clone().with_id(id.clone());
            return Ok(id);
        }

        let id = ObjectId::new().to_hex();
        companies.push(company.clone().with_id(id.clone()));
        Ok(id)
    }
}

fn matches_filter(company: &Company, filter: &CompanyFilter) -> bool {
    if let Some(major) = &filter.major {
        if !company.majors_hiring.iter().any(|hiring| hiring == major) {
            return false;
        }
    }

    match &filter.keyword {
        Some(keyword) => matches_keyword(company, keyword),
        None => true,
    }
}

fn matches_keyword(company: &Company, keyword: &KeywordMatch) -> bool {
    let listed = keyword
        .variants
        .iter()
        .any(|variant| company.keywords.contains(variant));

    listed || text_matches(company, &keyword.text)
}

/// Any query term present in any of the text-indexed fields.
fn text_matches(company: &Company, text: &str) -> bool {
    let terms: HashSet<String> = text_terms(text).collect();
    if terms.is_empty() {
        return false;
    }

    [
        Some(company.about.as_str()),
        Some(company.business_model.as_str()),
        company.example_projects.as_deref(),
    ]
    .into_iter()
    .flatten()
    .flat_map(text_terms)
    .any(|term| terms.contains(&term))
}

fn text_terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
        .map(|token| stem(&token))
}

fn stem(token: &str) -> String {
    for suffix in ["ies", "ing", "ed", "es", "s"] {
        if let Some(root) = token.strip_suffix(suffix) {
            if root.chars().count() >= 3 {
                return if suffix == "ies" {
                    format!("{root}y")
                } else {
                    root.to_string()
                };
            }
        }
    }
    token.to_string()
}
