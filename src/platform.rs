use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Platform {
    YouTube,
    Instagram,
    TikTok,
    Twitter,
    Facebook,
    SoundCloud,
    Spotify,
    Pinterest,
    Vimeo,
    Dailymotion,
}

impl Platform {
    #[cfg(test)]
    pub const ALL: [Platform; 10] = [
        Platform::YouTube,
        Platform::Instagram,
        Platform::TikTok,
        Platform::Twitter,
        Platform::Facebook,
        Platform::SoundCloud,
        Platform::Spotify,
        Platform::Pinterest,
        Platform::Vimeo,
        Platform::Dailymotion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Instagram => "Instagram",
            Self::TikTok => "TikTok",
            Self::Twitter => "Twitter",
            Self::Facebook => "Facebook",
            Self::SoundCloud => "SoundCloud",
            Self::Spotify => "Spotify",
            Self::Pinterest => "Pinterest",
            Self::Vimeo => "Vimeo",
            Self::Dailymotion => "Dailymotion",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const PATTERN_TABLE: [(Platform, &[&str]); 10] = [
    (
        Platform::YouTube,
        &[
            r"^(https?://)?(www\.)?(youtube\.com|youtu\.be)/.+",
            r"^(https?://)?(www\.)?youtube\.com/shorts/.+",
        ],
    ),
    (
        Platform::Instagram,
        &[
            r"^(https?://)?(www\.)?instagram\.com/(p|reel|reels|tv)/.+",
            r"^(https?://)?(www\.)?instagram\.com/stories/.+",
        ],
    ),
    (
        Platform::TikTok,
        &[r"^(https?://)?(www\.)?(tiktok\.com|vm\.tiktok\.com)/.+"],
    ),
    (
        Platform::Twitter,
        &[r"^(https?://)?(www\.)?(twitter\.com|x\.com)/\w+/status/.+"],
    ),
    (
        Platform::Facebook,
        &[r"^(https?://)?(www\.)?(facebook\.com|fb\.watch|m\.facebook\.com)/.+"],
    ),
    (
        Platform::SoundCloud,
        &[r"^(https?://)?(www\.)?soundcloud\.com/.+"],
    ),
    (
        Platform::Spotify,
        &[r"^(https?://)?(open\.)?spotify\.com/(track|album|playlist|artist)/.+"],
    ),
    (
        Platform::Pinterest,
        &[r"^(https?://)?(www\.)?(pinterest\.com|pin\.it)/.+"],
    ),
    (Platform::Vimeo, &[r"^(https?://)?(www\.)?vimeo\.com/.+"]),
    (
        Platform::Dailymotion,
        &[
            r"^(https?://)?(www\.)?dailymotion\.com/.+",
            r"^(https?://)?(www\.)?dai\.ly/.+",
        ],
    ),
];

// Compiled once; order is significant, first match wins.
static PLATFORM_RULES: LazyLock<Vec<(Platform, Vec<Regex>)>> = LazyLock::new(|| {
    PATTERN_TABLE
        .iter()
        .map(|(platform, patterns)| {
            let compiled = patterns
                .iter()
                .map(|pattern| {
                    Regex::new(&format!("(?i){pattern}"))
                        .unwrap_or_else(|error| panic!("invalid pattern for {platform}: {error}"))
                })
                .collect();
            (*platform, compiled)
        })
        .collect()
});

/// Returns the first platform whose patterns match `url`, or `None` when the
/// URL belongs to no supported platform.
pub fn detect(url: &str) -> Option<Platform> {
    PLATFORM_RULES
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|pattern| pattern.is_match(url)))
        .map(|(platform, _)| *platform)
}
