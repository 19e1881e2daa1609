use crate::query::{CompanyFilter, CompanyQuery};
use crate::traits::CompanyStore;
use crate::{Company, CompanySummary, NewCompany, StoreError};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use mongodb::options::{Collation, CollationStrength, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

pub const DEFAULT_COLLECTION: &str = "companies";

#[derive(Debug, Deserialize)]
struct CompanyDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    about: String,
    #[serde(default)]
    example_projects: Option<String>,
    business_model: String,
    majors_hiring: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

impl CompanyDocument {
    fn into_company(self) -> Company {
        Company {
            id: self.id.to_hex(),
            name: self.name,
            about: self.about,
            example_projects: self.example_projects,
            business_model: self.business_model,
            majors_hiring: self.majors_hiring,
            keywords: self.keywords,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
}

/// Company collection in MongoDB. The client is created on first use and
/// shared by every later call; concurrent first calls wait on one attempt.
pub struct MongoCompanyStore {
    uri: String,
    database: String,
    collection: String,
    client: OnceCell<Client>,
}

impl MongoCompanyStore {
    pub fn new(
        uri: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            collection: collection.into(),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<&Client, StoreError> {
        self.client
            .get_or_try_init(|| async {
                let client = Client::with_uri_str(&self.uri).await?;
                info!(database = %self.database, "connected to mongodb");
                Ok::<_, StoreError>(client)
            })
            .await
    }

    async fn companies(&self) -> Result<Collection<CompanyDocument>, StoreError> {
        Ok(self
            .client()
            .await?
            .database(&self.database)
            .collection(&self.collection))
    }
}

#[async_trait]
impl CompanyStore for MongoCompanyStore {
    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let indexes = [
            IndexModel::builder()
                .keys(doc! {
                    "about": "text",
                    "business_model": "text",
                    "example_projects": "text",
                })
                .build(),
            IndexModel::builder().keys(doc! { "keywords": 1 }).build(),
            IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        ];

        self.companies().await?.create_indexes(indexes).await?;
        info!(collection = %self.collection, "mongodb indexes ensured");
        Ok(())
    }

    async fn find_companies(
        &self,
        query: &CompanyQuery,
    ) -> Result<Vec<CompanySummary>, StoreError> {
        let filter = filter_document(&query.filter);
        debug!(filter = %filter, sorted = query.sort_by_name, "mongodb find");

        let collection = self.companies().await?.clone_with_type::<SummaryDocument>();
        let mut find = collection
            .find(filter)
            .projection(doc! { "_id": 1, "name": 1 });
        if query.sort_by_name {
            find = find.sort(doc! { "name": 1 }).collation(name_collation());
        }

        let documents: Vec<SummaryDocument> = find.await?.try_collect().await?;
        Ok(documents
            .into_iter()
            .map(|document| CompanySummary {
                id: document.id.to_hex(),
                name: document.name,
            })
            .collect())
    }

    async fn company_by_id(&self, id: &str) -> Result<Option<Company>, StoreError> {
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let found = self
            .companies()
            .await?
            .find_one(doc! { "_id": object_id })
            .await?;
        Ok(found.map(CompanyDocument::into_company))
    }

    async fn upsert_company(&self, company: &NewCompany) -> Result<String, StoreError> {
        let collection = self.companies().await?.clone_with_type::<Document>();
        let fields = mongodb::bson::to_document(company)?;

        let result = collection
            .update_one(
                doc! { "name": company.name.as_str() },
                doc! { "$set": fields },
            )
            .upsert(true)
            .await?;

        if let Some(id) = result.upserted_id.as_ref().and_then(Bson::as_object_id) {
            return Ok(id.to_hex());
        }

        let existing = collection
            .find_one(doc! { "name": company.name.as_str() })
            .projection(doc! { "_id": 1 })
            .await?
            .ok_or_else(|| StoreError::BackendResponse {
                backend: "mongodb".to_string(),
                details: format!("upserted company {} could not be read back", company.name),
            })?;

        existing
            .get_object_id("_id")
            .map(|id| id.to_hex())
            .map_err(|error| StoreError::BackendResponse {
                backend: "mongodb".to_string(),
                details: error.to_string(),
            })
    }
}

/// Store filter for one query: major membership plus, for a keyword,
/// `$text` search OR exact membership of a case variant in `keywords`.
pub fn filter_document(filter: &CompanyFilter) -> Document {
    let mut document = Document::new();

    if let Some(major) = &filter.major {
        document.insert("majors_hiring", major.as_str());
    }

    if let Some(keyword) = &filter.keyword {
        let mut alternatives = Vec::with_capacity(2);
        if !keyword.text.is_empty() {
            alternatives.push(doc! { "$text": { "$search": keyword.text.as_str() } });
        }
        alternatives.push(doc! { "keywords": { "$in": keyword.variants.clone() } });
        document.insert("$or", alternatives);
    }

    document
}

/// English, case-insensitive, digits compared by value.
pub fn name_collation() -> Collation {
    Collation::builder()
        .locale("en")
        .strength(CollationStrength::Secondary)
        .numeric_ordering(true)
        .build()
}
