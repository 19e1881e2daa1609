pub mod collation;
pub mod completion;
pub mod directory;
pub mod error;
pub mod export;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod pdf;
pub mod query;
pub mod stores;
pub mod traits;

pub use collation::{compare_names, sort_by_name};
pub use completion::{
    CompletionConfig, OpenAiCompletionClient, DEFAULT_MODEL, OPENAI_CHAT_COMPLETIONS_URL,
};
pub use directory::{intersect_by_id, CompanyDirectory};
pub use error::{ExtractError, StoreError};
pub use export::{shortlist_csv, CSV_FILE_NAME};
pub use extractor::{
    build_prompt, parse_company, CompanyExtractor, ExtractionOptions, ExtractionReport,
    SkippedPage, DEFAULT_PAGE_DELAY, EXPECTED_KEYWORDS,
};
pub use ingest::{load_seed_file, persist_companies, write_companies_json, PersistReport};
pub use models::{Company, CompanySummary, NewCompany, SearchRequest, KNOWN_MAJORS};
pub use pdf::{LopdfDocument, PageSource};
pub use query::{case_variants, plan_search, CompanyFilter, CompanyQuery, KeywordMatch, SearchPlan};
pub use stores::{MemoryCompanyStore, MongoCompanyStore};
pub use traits::{CompanyStore, CompletionClient};
