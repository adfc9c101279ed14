use std::{collections::HashSet, sync::Arc, time::Duration};

use axum::http::{HeaderName, HeaderValue, Method, header::CONTENT_DISPOSITION};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    catalog::{FixedPicker, RandomPicker, VariantPicker},
    error::ApiError,
    extractor::{DEFAULT_PROGRAM, Extractor},
    resolver::ResolveMode,
};

pub const DOWNLOAD_FILENAME_HEADER: &str = "x-download-filename";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8787";
const DEFAULT_MOCK_DELAY_MS: u64 = 1500;
const DEFAULT_DEV_ORIGINS: [&str; 2] = ["http://127.0.0.1:3000", "http://localhost:3000"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeSetting {
    Extract,
    Mock,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
    pub mode: ModeSetting,
    pub mock_delay: Duration,
    pub mock_variant: Option<usize>,
    pub extractor_program: String,
    pub extractor_args: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mode = match lookup("RESOLVER_MODE")
            .map(|value| value.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("mock") => ModeSetting::Mock,
            Some("extract") | Some("") | None => ModeSetting::Extract,
            Some(other) => {
                warn!("Unknown RESOLVER_MODE {other:?}; using extract.");
                ModeSetting::Extract
            }
        };

        let mock_delay = Duration::from_millis(
            read_number(&lookup, "MOCK_DELAY_MS").unwrap_or(DEFAULT_MOCK_DELAY_MS),
        );
        let mock_variant = read_number(&lookup, "MOCK_VARIANT").map(|value| value as usize);

        let extractor_program = lookup("YT_DLP_PATH")
            .and_then(|value| non_empty(&value).map(ToString::to_string))
            .unwrap_or_else(|| DEFAULT_PROGRAM.to_string());
        let extractor_args = lookup("YT_DLP_ARGS")
            .map(|value| value.split_whitespace().map(ToString::to_string).collect())
            .unwrap_or_default();

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|origins: &Vec<String>| !origins.is_empty())
            .unwrap_or_else(|| {
                warn!("ALLOWED_ORIGINS is not set. Allowing the local dev origins only.");
                DEFAULT_DEV_ORIGINS.iter().map(ToString::to_string).collect()
            });

        Self {
            bind_addr: resolve_bind_addr(&lookup),
            allowed_origins,
            mode,
            mock_delay,
            mock_variant,
            extractor_program,
            extractor_args,
        }
    }

    pub fn extractor(&self) -> Extractor {
        Extractor::new(self.extractor_program.clone()).with_base_args(self.extractor_args.clone())
    }

    pub fn resolve_mode(&self) -> ResolveMode {
        match self.mode {
            ModeSetting::Extract => ResolveMode::Extract,
            ModeSetting::Mock => {
                let picker: Arc<dyn VariantPicker> = match self.mock_variant {
                    Some(index) => Arc::new(FixedPicker(index)),
                    None => Arc::new(RandomPicker),
                };
                ResolveMode::Mock {
                    picker,
                    delay: self.mock_delay,
                }
            }
        }
    }

    /// The allow-list in canonical `scheme://host[:port]` form.
    pub fn normalized_origins(&self) -> Result<HashSet<String>, ApiError> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                normalize_origin(origin).ok_or_else(|| {
                    ApiError::internal(format!(
                        "ALLOWED_ORIGINS entry {origin:?} is not an origin such as https://example.com"
                    ))
                })
            })
            .collect()
    }

    pub fn cors_layer(&self) -> Result<CorsLayer, ApiError> {
        let origins = Arc::new(self.normalized_origins()?);
        info!("CORS enabled for {} origin(s): {:?}", origins.len(), origins);

        let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let allowed = origin
                .to_str()
                .ok()
                .and_then(normalize_origin)
                .is_some_and(|candidate| origins.contains(&candidate));
            if !allowed {
                debug!("Refusing CORS origin {origin:?}");
            }
            allowed
        });

        Ok(CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
            .expose_headers([
                CONTENT_DISPOSITION,
                HeaderName::from_static(DOWNLOAD_FILENAME_HEADER),
            ]))
    }
}

fn read_number(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<u64> {
    lookup(name).and_then(|value| value.trim().parse::<u64>().ok())
}

fn resolve_bind_addr(lookup: &impl Fn(&str) -> Option<String>) -> String {
    if let Some(configured) = lookup("APP_ADDR").and_then(|value| non_empty(&value).map(ToString::to_string)) {
        return configured;
    }

    if let Some(port) = lookup("PORT").and_then(|value| value.trim().parse::<u16>().ok()) {
        return format!("0.0.0.0:{port}");
    }

    DEFAULT_BIND_ADDR.to_string()
}

pub fn normalize_origin(value: &str) -> Option<String> {
    let parsed = Url::parse(value).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let scheme = parsed.scheme();
    let default_port = match scheme {
        "http" => 80,
        "https" => 443,
        _ => return None,
    };

    if parsed.path() != "/" || parsed.query().is_some() || parsed.fragment().is_some() {
        return None;
    }

    match parsed.port() {
        Some(port) if port != default_port => Some(format!("{scheme}://{host}:{port}")),
        _ => Some(format!("{scheme}://{host}")),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
