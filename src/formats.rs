use std::collections::HashSet;

use serde::Serialize;

use crate::extractor::YtDlpFormat;

pub const MAX_DOWNLOAD_OPTIONS: usize = 8;

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadOption {
    pub quality: String,
    pub format: String,
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Shapes the extractor's raw format list into the options offered to the
/// user: playable entries only, muxed before audio-only, unique by
/// (quality, format), at most [`MAX_DOWNLOAD_OPTIONS`].
pub fn build_download_options(formats: &[YtDlpFormat]) -> Vec<DownloadOption> {
    let mut playable: Vec<&YtDlpFormat> = formats
        .iter()
        .filter(|item| has_source_url(item) && (has_video(item) || has_audio(item)))
        .filter(|item| is_muxed(item) || is_audio_only(item))
        .collect();

    // Stable: source order survives within each group.
    playable.sort_by_key(|item| !is_muxed(item));

    let mut options = Vec::new();
    let mut seen = HashSet::new();

    for item in playable {
        if options.len() >= MAX_DOWNLOAD_OPTIONS {
            break;
        }

        let option = to_download_option(item);
        if seen.insert((option.quality.clone(), option.format.clone())) {
            options.push(option);
        }
    }

    if options.is_empty()
        && let Some(best) = formats.last()
    {
        options.push(to_download_option(best));
    }

    options
}

fn to_download_option(item: &YtDlpFormat) -> DownloadOption {
    DownloadOption {
        quality: quality_label(item),
        format: item
            .ext
            .as_deref()
            .and_then(non_empty)
            .unwrap_or("mp4")
            .to_string(),
        size: format_bytes(item.byte_size()),
        url: item.url.clone(),
    }
}

pub fn quality_label(item: &YtDlpFormat) -> String {
    if let Some(note) = item.format_note.as_deref().and_then(non_empty) {
        return note.to_string();
    }
    if let Some(resolution) = item.resolution.as_deref().and_then(non_empty) {
        return resolution.to_string();
    }
    if !has_video(item) {
        return "Audio Only".to_string();
    }
    if let Some(height) = item.height.filter(|height| *height > 0) {
        return format!("{height}p");
    }
    "Standard".to_string()
}

/// Binary (1024-based) size rendering; zero or unknown is "Unknown".
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "Unknown".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{value:.2} {}", SIZE_UNITS[unit])
}

/// `H:MM:SS`, or `M:SS` under an hour; zero or unknown is "-".
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "-".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

fn has_source_url(format: &YtDlpFormat) -> bool {
    format.url.as_deref().and_then(non_empty).is_some()
}

pub fn has_video(format: &YtDlpFormat) -> bool {
    matches!(format.vcodec.as_deref(), Some(value) if is_codec(value))
}

pub fn has_audio(format: &YtDlpFormat) -> bool {
    matches!(format.acodec.as_deref(), Some(value) if is_codec(value))
}

fn is_muxed(format: &YtDlpFormat) -> bool {
    has_video(format) && has_audio(format)
}

fn is_audio_only(format: &YtDlpFormat) -> bool {
    !has_video(format) && has_audio(format)
}

fn is_codec(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "none"
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
