use std::time::Instant;

use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
};
use chrono::{SecondsFormat, Utc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::AppState;
use crate::api::models::{CrawlRequest, CrawlResponse, ExtractRequest, ExtractResponse};
use crate::api::response;
use crate::crawl::{CrawlClient, poll};
use crate::error::{AppError, Result};
use crate::rate_limit::client_key;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/crawl", post(crawl_handler))
        .route("/api/extract", post(extract_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

/// received -> validated -> rate-checked -> submitted -> polled -> responded
async fn crawl_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<CrawlRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let start_time = Instant::now();
    let Json(req) = payload?;
    let url = req.validated_url()?;

    let key = client_key(&headers);
    if !state.rate_limiter.check_and_record(&key) {
        warn!(%key, "Rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    let client = CrawlClient::from_config(&state.config.crawl)?;

    info!(%url, "Processing crawl request");
    let job_id = client.submit(&url).await?;
    let content = poll(&client, &job_id, state.config.crawl.poll).await?;

    info!(%url, %job_id, elapsed = ?start_time.elapsed(), "Crawl request completed");
    Ok(response::success(CrawlResponse {
        data: content,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn extract_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload?;
    let request = req.into_extraction()?;

    info!(model = %request.model, fields = request.fields.len(), "Processing extraction request");
    let extracted_data = state.extractor.extract(&request).await.map_err(|err| {
        error!(model = %request.model, "Extraction failed: {}", err);
        match err {
            AppError::Config(_) | AppError::Extraction(_) => err,
            other => AppError::Extraction(other.to_string()),
        }
    })?;

    Ok(response::success(ExtractResponse { extracted_data }))
}
