use crate::traits::CompanyStore;
use crate::{NewCompany, StoreError};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Reads a JSON array of company records, as written by
/// [`write_companies_json`].
pub fn load_seed_file(path: &Path) -> Result<Vec<NewCompany>, StoreError> {
    let bytes = fs::read(path)?;
    let companies: Vec<NewCompany> = serde_json::from_slice(&bytes)?;
    Ok(companies)
}

pub fn write_companies_json(path: &Path, companies: &[NewCompany]) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(companies)?;
    fs::write(path, payload)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct StoredCompany {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct FailedCompany {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct PersistReport {
    pub stored: Vec<StoredCompany>,
    pub failed: Vec<FailedCompany>,
}

/// Upserts every record by name. A record the store rejects is reported
/// and the rest are still written.
pub async fn persist_companies(
    store: &dyn CompanyStore,
    companies: &[NewCompany],
) -> PersistReport {
    let mut stored = Vec::new();
    let mut failed = Vec::new();

    for company in companies {
        match store.upsert_company(company).await {
            Ok(id) => {
                info!(company = %company.name, id = %id, "stored company");
                stored.push(StoredCompany {
                    id,
                    name: company.name.clone(),
                });
            }
            Err(error) => {
                warn!(company = %company.name, error = %error, "failed to store company");
                failed.push(FailedCompany {
                    name: company.name.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    PersistReport { stored, failed }
}
