use std::{any::Any, sync::Arc};

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State, rejection::JsonRejection},
    http::{
        HeaderMap, HeaderName, HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, error, info};

use crate::{
    config::DOWNLOAD_FILENAME_HEADER,
    error::ApiError,
    resolver::{MetadataRecord, Resolver},
};

pub const DEFAULT_FILENAME: &str = "video.mp4";

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<Resolver>,
}

impl AppState {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub success: bool,
    #[serde(flatten)]
    pub record: MetadataRecord,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
    pub filename: Option<String>,
}

pub fn router(state: AppState) -> Router {
    with_service_layers(
        Router::new()
            .route("/api/health", get(health))
            .route("/resolve", post(resolve_metadata))
            .route("/proxy", get(proxy_download))
            .route("/api/download", post(resolve_metadata))
            .route("/api/download/file", get(proxy_download))
            .with_state(state),
    )
}

// Panics become the same JSON error body every other failure uses.
fn with_service_layers(routes: Router) -> Router {
    routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    error!("Handler panicked: {detail}");
    ApiError::internal("Internal server error.").into_response()
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

pub async fn resolve_metadata(
    State(state): State<AppState>,
    payload: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        debug!("Rejected resolve body: {rejection}");
        ApiError::invalid_input("Request body must be JSON with a \"url\" field.")
    })?;

    let record = state
        .resolver
        .resolve(payload.url.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(ResolveResponse {
        success: true,
        record,
    }))
}

pub async fn proxy_download(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response, ApiError> {
    let url = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::missing_input("Missing URL"))?;
    let filename = query
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_FILENAME);

    let media = state.resolver.extractor().open_stream(url).await?;
    info!("Stream {} relaying {:?} as {:?}", media.id(), url, filename);

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&build_content_disposition(filename))
            .map_err(|_| ApiError::internal("Could not build the download header."))?,
    );
    headers.insert(
        HeaderName::from_static(DOWNLOAD_FILENAME_HEADER),
        HeaderValue::from_str(&sanitize_ascii_filename(filename))
            .map_err(|_| ApiError::internal("Could not build the file name header."))?,
    );

    let body = Body::from_stream(media.into_body_stream());
    Ok((StatusCode::OK, headers, body).into_response())
}

pub fn build_content_disposition(filename: &str) -> String {
    let encoded = urlencoding::encode(filename);
    format!("attachment; filename=\"{encoded}\"; filename*=UTF-8''{encoded}")
}

pub fn sanitize_ascii_filename(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric()
                || matches!(character, '.' | '-' | '_' | ' ' | '(' | ')')
            {
                character
            } else {
                '_'
            }
        })
        .collect();

    let compact = sanitized.trim();
    if compact.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        compact.to_string()
    }
}
