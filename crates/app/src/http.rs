use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use company_finder_core::{
    shortlist_csv, Company, CompanyDirectory, CompanySummary, SearchRequest, CSV_FILE_NAME,
    KNOWN_MAJORS,
};
use serde_json::json;
use tracing::{error, info, warn};

#[derive(Clone)]
struct AppState {
    directory: CompanyDirectory,
}

/// Failures surfaced to HTTP callers. Only the fixed message is returned;
/// the detail is logged.
#[derive(Debug)]
enum ApiError {
    SearchFailed(String),
    MissingCompanyId,
    CompanyNotFound,
    DetailFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::SearchFailed(detail) => {
                error!(detail = %detail, "company search failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to search companies")
            }
            Self::MissingCompanyId => (StatusCode::BAD_REQUEST, "Company ID is required"),
            Self::CompanyNotFound => (StatusCode::NOT_FOUND, "Company not found"),
            Self::DetailFailed(detail) => {
                error!(detail = %detail, "company detail lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch company details")
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn router(directory: CompanyDirectory) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/search/export", post(export_shortlist))
        .route("/api/companies", get(missing_company_id))
        .route("/api/companies/", get(missing_company_id))
        .route("/api/companies/{id}", get(company_detail))
        .route("/api/majors", get(majors))
        .route("/api/health", get(health))
        .with_state(AppState { directory })
}

pub async fn serve(bind: &str, directory: CompanyDirectory) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, router(directory))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn search(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<CompanySummary>>, ApiError> {
    Ok(Json(run_search(&state, &body).await?))
}

async fn export_shortlist(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let hits = run_search(&state, &body).await?;
    let disposition = format!("attachment; filename=\"{CSV_FILE_NAME}\"");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        shortlist_csv(&hits),
    )
        .into_response())
}

async fn run_search(state: &AppState, body: &[u8]) -> Result<Vec<CompanySummary>, ApiError> {
    let request: SearchRequest = serde_json::from_slice(body)
        .map_err(|error| ApiError::SearchFailed(format!("invalid request body: {error}")))?;

    let hits = state
        .directory
        .search(&request)
        .await
        .map_err(|error| ApiError::SearchFailed(error.to_string()))?;

    info!(
        major = %request.major,
        keywords = ?request.keyword_terms(),
        hits = hits.len(),
        "company search"
    );
    Ok(hits)
}

async fn missing_company_id() -> ApiError {
    ApiError::MissingCompanyId
}

async fn company_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Company>, ApiError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::MissingCompanyId);
    }

    match state.directory.company(id).await {
        Ok(Some(company)) => Ok(Json(company)),
        Ok(None) => Err(ApiError::CompanyNotFound),
        Err(error) => Err(ApiError::DetailFailed(error.to_string())),
    }
}

async fn majors() -> Json<[&'static str; 20]> {
    Json(KNOWN_MAJORS)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "message": "success" }))
}
