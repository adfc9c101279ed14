use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::{
    catalog::{self, VariantPicker},
    error::ApiError,
    extractor::{Extractor, YtDlpInfo},
    formats::{DownloadOption, build_download_options, format_duration},
    platform::{self, Platform},
};

#[derive(Debug, Clone, Serialize)]
pub struct MetadataRecord {
    pub platform: Platform,
    pub title: String,
    pub thumbnail: Option<String>,
    pub duration: String,
    pub options: Vec<DownloadOption>,
}

#[derive(Clone)]
pub enum ResolveMode {
    /// Ask the extraction program for real metadata.
    Extract,
    /// Serve canned catalog entries after an artificial delay.
    Mock {
        picker: Arc<dyn VariantPicker>,
        delay: Duration,
    },
}

impl std::fmt::Debug for ResolveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extract => f.write_str("Extract"),
            Self::Mock { delay, .. } => f.debug_struct("Mock").field("delay", delay).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolver {
    extractor: Extractor,
    mode: ResolveMode,
}

impl Resolver {
    pub fn new(extractor: Extractor, mode: ResolveMode) -> Self {
        Self { extractor, mode }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub async fn resolve(&self, input: &str) -> Result<MetadataRecord, ApiError> {
        let (url, platform) = validate_url(input)?;
        debug!("Resolving {platform} URL {:?}", url);

        match &self.mode {
            ResolveMode::Extract => {
                let raw = self.extractor.fetch_info(url).await?;
                let record = build_record(platform, raw);
                info!(
                    "Resolved {platform} URL with {} option(s)",
                    record.options.len()
                );
                Ok(record)
            }
            ResolveMode::Mock { picker, delay } => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                mock_record(platform, picker.as_ref())
            }
        }
    }
}

/// Checks presence, syntax and platform support, in that order, before any
/// process is spawned.
pub fn validate_url(input: &str) -> Result<(&str, Platform), ApiError> {
    let url = input.trim();
    if url.is_empty() {
        return Err(ApiError::missing_input("URL must not be empty."));
    }

    let parsed = Url::parse(url).map_err(|_| ApiError::invalid_input("Invalid URL format."))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ApiError::invalid_input("Invalid URL format."));
    }

    let platform = platform::detect(url).ok_or_else(|| {
        ApiError::unsupported_platform(
            "Platform not supported. Make sure the URL comes from a supported platform.",
        )
    })?;

    Ok((url, platform))
}

pub fn build_record(platform: Platform, info: YtDlpInfo) -> MetadataRecord {
    let options = build_download_options(&info.formats);
    let duration = format_duration(info.duration_seconds());
    let title = info
        .title
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    MetadataRecord {
        platform,
        title,
        thumbnail: info.thumbnail.filter(|value| !value.trim().is_empty()),
        duration,
        options,
    }
}

fn mock_record(platform: Platform, picker: &dyn VariantPicker) -> Result<MetadataRecord, ApiError> {
    let entry = catalog::lookup(platform)
        .ok_or_else(|| ApiError::internal(format!("No catalog entry for {platform}.")))?;
    let variant = &entry.variants[picker.pick(entry.variants.len())];

    Ok(MetadataRecord {
        platform,
        title: variant.title.to_string(),
        thumbnail: Some(variant.thumbnail.to_string()),
        duration: variant.duration.to_string(),
        options: entry.download_options(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::FixedPicker, error::ErrorKind};
    use tempfile::tempdir;

    fn mock_resolver(index: usize) -> Resolver {
        Resolver::new(
            Extractor::new("definitely-not-an-extractor-binary"),
            ResolveMode::Mock {
                picker: Arc::new(FixedPicker(index)),
                delay: Duration::ZERO,
            },
        )
    }

    fn extract_resolver(script: &str) -> Resolver {
        Resolver::new(
            Extractor::new("sh").with_base_args(["-c", script, "sh"]),
            ResolveMode::Extract,
        )
    }

    #[tokio::test]
    async fn empty_url_is_missing_input() {
        let error = mock_resolver(0).resolve("").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::MissingInput);
        let error = mock_resolver(0).resolve("   ").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::MissingInput);
    }

    #[tokio::test]
    async fn malformed_url_is_invalid_input() {
        let error = mock_resolver(0).resolve("not a url").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
        let error = mock_resolver(0).resolve("youtube.com/watch?v=1").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn unknown_site_is_unsupported() {
        let error = mock_resolver(0)
            .resolve("https://example.com/x")
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::UnsupportedPlatform);
    }

    #[tokio::test]
    async fn validation_happens_before_spawning() {
        // The program does not exist, so reaching it would be ExtractionFailed.
        let resolver = Resolver::new(
            Extractor::new("definitely-not-an-extractor-binary"),
            ResolveMode::Extract,
        );
        let error = resolver.resolve("https://example.com/x").await.unwrap_err();
        assert_eq!(error.kind, ErrorKind::UnsupportedPlatform);

        let error = resolver
            .resolve("https://youtu.be/abc")
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::ExtractionFailed);
    }

    #[tokio::test]
    async fn mock_mode_returns_picked_variant() {
        let record = mock_resolver(2)
            .resolve("https://www.youtube.com/watch?v=abc")
            .await
            .unwrap();

        assert_eq!(record.platform, Platform::YouTube);
        assert_eq!(record.title, "Tips Produktivitas untuk Developer");
        assert_eq!(
            record.thumbnail.as_deref(),
            Some("https://picsum.photos/seed/yt3/640/360")
        );
        assert_eq!(record.duration, "1:15:00");
        assert_eq!(record.options.len(), 6);
        assert_eq!(record.options[0].quality, "2160p (4K)");
        assert_eq!(record.options[5].quality, "Audio Only");
    }

    #[tokio::test]
    async fn mock_mode_keeps_dash_duration() {
        let record = mock_resolver(0)
            .resolve("https://pin.it/abc")
            .await
            .unwrap();
        assert_eq!(record.platform, Platform::Pinterest);
        assert_eq!(record.duration, "-");
    }

    #[tokio::test]
    async fn extract_mode_shapes_formats() {
        let dir = tempdir().unwrap();
        let fixture = dir.path().join("info.json");
        std::fs::write(
            &fixture,
            r#"{
                "title": "Concert",
                "thumbnail": "https://img.test/c.jpg",
                "duration": 65,
                "formats": [
                    {"ext": "m4a", "vcodec": "none", "acodec": "mp4a", "format_note": "medium",
                     "filesize": 1048576, "url": "https://cdn.test/a"},
                    {"ext": "mp4", "vcodec": "avc1", "acodec": "none", "height": 1080,
                     "url": "https://cdn.test/v"},
                    {"ext": "mp4", "vcodec": "avc1", "acodec": "mp4a", "height": 360,
                     "filesize": 1024, "url": "https://cdn.test/18"},
                    {"ext": "mp4", "vcodec": "avc1", "acodec": "mp4a", "height": 360,
                     "url": "https://cdn.test/18b"}
                ]
            }"#,
        )
        .unwrap();

        let resolver = extract_resolver(&format!("cat '{}'", fixture.display()));
        let record = resolver
            .resolve("https://www.youtube.com/watch?v=abc")
            .await
            .unwrap();

        assert_eq!(record.platform, Platform::YouTube);
        assert_eq!(record.title, "Concert");
        assert_eq!(record.duration, "1:05");
        assert_eq!(
            record.options,
            [
                DownloadOption {
                    quality: "360p".to_string(),
                    format: "mp4".to_string(),
                    size: "1.00 KB".to_string(),
                    url: Some("https://cdn.test/18".to_string()),
                },
                DownloadOption {
                    quality: "medium".to_string(),
                    format: "m4a".to_string(),
                    size: "1.00 MB".to_string(),
                    url: Some("https://cdn.test/a".to_string()),
                },
            ]
        );
    }

    #[test]
    fn record_without_title_or_duration_uses_placeholders() {
        let record = build_record(Platform::Vimeo, YtDlpInfo::default());
        assert_eq!(record.title, "Untitled");
        assert_eq!(record.duration, "-");
        assert!(record.thumbnail.is_none());
        assert!(record.options.is_empty());
    }
}
