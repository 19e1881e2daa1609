use crate::{
    Company, CompanyQuery, CompanySummary, ExtractError, NewCompany, StoreError,
};
use async_trait::async_trait;

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn ensure_indexes(&self) -> Result<(), StoreError>;

    async fn find_companies(&self, query: &CompanyQuery)
        -> Result<Vec<CompanySummary>, StoreError>;

    /// `None` when no record has this id, including ids the store could
    /// never have issued.
    async fn company_by_id(&self, id: &str) -> Result<Option<Company>, StoreError>;

    /// Insert, or replace the fields of the record with the same name.
    /// Returns the record id.
    async fn upsert_company(&self, company: &NewCompany) -> Result<String, StoreError>;
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ExtractError>;
}
