mod http;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use company_finder_core::stores::mongo::DEFAULT_COLLECTION;
use company_finder_core::{
    load_seed_file, persist_companies, shortlist_csv, write_companies_json, CompanyDirectory,
    CompanyExtractor, CompanyStore, CompletionConfig, ExtractionOptions, LopdfDocument,
    MemoryCompanyStore, MongoCompanyStore, OpenAiCompletionClient, PageSource, SearchRequest,
    DEFAULT_MODEL, OPENAI_CHAT_COMPLETIONS_URL,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "company-finder", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Document store backend
    #[arg(long, value_enum, default_value_t = StoreKind::Mongo)]
    store: StoreKind,

    /// MongoDB connection string
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB_NAME", default_value = "company_finder")]
    mongodb_db: String,

    /// Collection holding company records
    #[arg(long, default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// JSON array of company records upserted into the store at startup.
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    Mongo,
    Memory,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the search and company detail API.
    Serve {
        /// Socket address to listen on.
        #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:3000")]
        bind: String,
    },
    /// Search companies and print or export the matches.
    Search {
        /// Only companies hiring this major (exact match).
        #[arg(long, default_value = "")]
        major: String,
        /// Keyword; repeat to require every keyword.
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        /// Write the matches as an application shortlist CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Extract company records from a PDF brochure with a language model.
    Extract {
        /// Brochure to read, one company per page.
        #[arg(long, default_value = "./comps.pdf")]
        pdf: PathBuf,
        /// Process at most this many pages (default: all).
        #[arg(long)]
        page_limit: Option<usize>,
        /// Pause between pages, in milliseconds.
        #[arg(long, default_value = "1000")]
        page_delay_ms: u64,
        /// Write extracted records to this JSON file.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Upsert extracted records into the store.
        #[arg(long, default_value_t = false)]
        persist: bool,
        /// API key for the completion endpoint.
        #[arg(long, env = "OPENAI_KEY", hide_env_values = true)]
        openai_key: Option<String>,
        /// Chat completions endpoint.
        #[arg(long, env = "COMPLETION_URL", default_value = OPENAI_CHAT_COMPLETIONS_URL)]
        completion_url: String,
        /// Model name sent with each request.
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "company-finder boot"
    );

    match &cli.command {
        Command::Serve { bind } => {
            let directory = CompanyDirectory::new(open_store(&cli).await?);
            http::serve(bind, directory).await?;
        }
        Command::Search {
            major,
            keywords,
            csv,
        } => {
            let directory = CompanyDirectory::new(open_store(&cli).await?);
            let request = SearchRequest::new(major.clone(), keywords.clone());
            let hits = directory
                .search(&request)
                .await
                .context("company search failed")?;

            for hit in &hits {
                println!("{}  {}", hit.id, hit.name);
            }
            println!("{} companies found", hits.len());

            if let Some(path) = csv {
                std::fs::write(path, shortlist_csv(&hits))
                    .with_context(|| format!("unable to write {}", path.display()))?;
                println!("shortlist written to {}", path.display());
            }
        }
        Command::Extract {
            pdf,
            page_limit,
            page_delay_ms,
            output,
            persist,
            openai_key,
            completion_url,
            model,
        } => {
            check_persist_target(cli.store, *persist)?;

            let document = LopdfDocument::open(pdf)
                .with_context(|| format!("unable to read {}", pdf.display()))?;
            info!(
                path = %pdf.display(),
                pages = document.page_count(),
                checksum = %document.checksum(),
                "loaded brochure"
            );

            let config = CompletionConfig::new(completion_url, openai_key.clone())?
                .with_model(model.clone());
            if config.api_key.is_none() {
                warn!("no OPENAI_KEY set; completion requests are sent unauthenticated");
            }

            let extractor = CompanyExtractor::new(
                OpenAiCompletionClient::new(config),
                ExtractionOptions {
                    page_limit: *page_limit,
                    page_delay: Duration::from_millis(*page_delay_ms),
                },
            );
            let report = extractor.extract(&document).await;

            for skipped in &report.skipped {
                warn!(page = skipped.page, reason = %skipped.reason, "skipped page");
            }

            if let Some(path) = output {
                write_companies_json(path, &report.companies)
                    .with_context(|| format!("unable to write {}", path.display()))?;
                println!("records written to {}", path.display());
            }

            if *persist {
                let store = open_store(&cli).await?;
                let persisted = persist_companies(store.as_ref(), &report.companies).await;
                println!(
                    "{} companies stored, {} rejected by the store",
                    persisted.stored.len(),
                    persisted.failed.len()
                );
            }

            println!(
                "{} companies extracted from {} of {} pages ({} skipped) at {}",
                report.companies.len(),
                report.pages_processed,
                report.pages_in_document,
                report.skipped.len(),
                report.finished_at.to_rfc3339()
            );
        }
    }

    Ok(())
}

/// The memory store lives only as long as this process, so persisting
/// extraction output into it would silently drop every record.
fn check_persist_target(store: StoreKind, persist: bool) -> anyhow::Result<()> {
    if persist && store == StoreKind::Memory {
        anyhow::bail!("--persist needs a durable store; rerun with --store mongo or use --output");
    }
    Ok(())
}

async fn open_store(cli: &Cli) -> anyhow::Result<Arc<dyn CompanyStore>> {
    let store: Arc<dyn CompanyStore> = match cli.store {
        StoreKind::Mongo => Arc::new(MongoCompanyStore::new(
            &cli.mongodb_uri,
            &cli.mongodb_db,
            &cli.collection,
        )),
        StoreKind::Memory => Arc::new(MemoryCompanyStore::new()),
    };

    if let Err(error) = store.ensure_indexes().await {
        warn!(error = %error, "could not ensure store indexes; keyword search may fail");
    }

    if let Some(path) = &cli.seed {
        let companies = load_seed_file(path)
            .with_context(|| format!("unable to load seed file {}", path.display()))?;
        let report = persist_companies(store.as_ref(), &companies).await;
        info!(
            path = %path.display(),
            stored = report.stored.len(),
            failed = report.failed.len(),
            "seeded store"
        );
        if report.stored.is_empty() && !report.failed.is_empty() {
            anyhow::bail!("no seed records could be stored; is the store reachable?");
        }
    }

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::{check_persist_target, Cli, Command, StoreKind};
    use clap::Parser;

    #[test]
    fn persisting_into_the_memory_store_is_rejected() {
        assert!(check_persist_target(StoreKind::Memory, true).is_err());
        assert!(check_persist_target(StoreKind::Memory, false).is_ok());
        assert!(check_persist_target(StoreKind::Mongo, true).is_ok());
    }

    #[test]
    fn extract_defaults_to_every_page_with_a_one_second_delay() {
        let cli = Cli::try_parse_from(["company-finder", "--store", "memory", "extract"])
            .expect("arguments parse");

        assert_eq!(cli.store, StoreKind::Memory);
        match cli.command {
            Command::Extract {
                page_limit,
                page_delay_ms,
                persist,
                ..
            } => {
                assert_eq!(page_limit, None);
                assert_eq!(page_delay_ms, 1000);
                assert!(!persist);
            }
            _ => panic!("expected the extract subcommand"),
        }
    }
}
