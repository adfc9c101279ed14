//! Canned metadata served when the resolver runs in mock mode.

use std::{collections::HashMap, sync::LazyLock};

use rand::Rng;

use crate::{formats::DownloadOption, platform::Platform};

pub struct MockVariant {
    pub title: &'static str,
    pub thumbnail: &'static str,
    pub duration: &'static str,
}

pub struct MockEntry {
    pub variants: [MockVariant; 3],
    pub options: &'static [(&'static str, &'static str, &'static str)],
}

impl MockEntry {
    pub fn download_options(&self) -> Vec<DownloadOption> {
        self.options
            .iter()
            .map(|(quality, format, size)| DownloadOption {
                quality: quality.to_string(),
                format: format.to_string(),
                size: size.to_string(),
                url: None,
            })
            .collect()
    }
}

/// Source of the variant index, so callers can pin the choice.
pub trait VariantPicker: Send + Sync {
    fn pick(&self, len: usize) -> usize;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPicker;

impl VariantPicker for RandomPicker {
    fn pick(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always picks the same index, clamped to the last variant.
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl VariantPicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

const fn variant(
    title: &'static str,
    thumbnail: &'static str,
    duration: &'static str,
) -> MockVariant {
    MockVariant {
        title,
        thumbnail,
        duration,
    }
}

static CATALOG: LazyLock<HashMap<Platform, MockEntry>> = LazyLock::new(|| {
    HashMap::from([
        (
            Platform::YouTube,
            MockEntry {
                variants: [
                    variant(
                        "Cara Membuat Website Modern dengan Next.js",
                        "https://picsum.photos/seed/yt1/640/360",
                        "10:30",
                    ),
                    variant(
                        "Tutorial React untuk Pemula - Lengkap",
                        "https://picsum.photos/seed/yt2/640/360",
                        "25:45",
                    ),
                    variant(
                        "Tips Produktivitas untuk Developer",
                        "https://picsum.photos/seed/yt3/640/360",
                        "1:15:00",
                    ),
                ],
                options: &[
                    ("2160p (4K)", "mp4", "850MB"),
                    ("1080p", "mp4", "250MB"),
                    ("720p", "mp4", "120MB"),
                    ("480p", "mp4", "60MB"),
                    ("360p", "mp4", "35MB"),
                    ("Audio Only", "mp3", "8MB"),
                ],
            },
        ),
        (
            Platform::Instagram,
            MockEntry {
                variants: [
                    variant(
                        "Reel Viral: Tips Fotografi",
                        "https://picsum.photos/seed/ig1/640/640",
                        "0:30",
                    ),
                    variant(
                        "Story Highlights - Travelling",
                        "https://picsum.photos/seed/ig2/640/640",
                        "0:15",
                    ),
                    variant(
                        "Post: Kuliner Nusantara",
                        "https://picsum.photos/seed/ig3/640/640",
                        "1:00",
                    ),
                ],
                options: &[
                    ("HD", "mp4", "25MB"),
                    ("SD", "mp4", "12MB"),
                    ("Story Size", "mp4", "15MB"),
                ],
            },
        ),
        (
            Platform::TikTok,
            MockEntry {
                variants: [
                    variant(
                        "Dance Challenge Terbaru 2024",
                        "https://picsum.photos/seed/tt1/640/640",
                        "0:15",
                    ),
                    variant(
                        "Life Hack yang Wajib Kamu Tahu",
                        "https://picsum.photos/seed/tt2/640/640",
                        "0:30",
                    ),
                    variant(
                        "Tutorial Makeup Simple",
                        "https://picsum.photos/seed/tt3/640/640",
                        "1:00",
                    ),
                ],
                options: &[
                    ("No Watermark", "mp4", "8MB"),
                    ("With Watermark", "mp4", "10MB"),
                    ("Audio Only", "mp3", "2MB"),
                ],
            },
        ),
        (
            Platform::Twitter,
            MockEntry {
                variants: [
                    variant(
                        "Thread: Tips Kerja Remote",
                        "https://picsum.photos/seed/tw1/640/360",
                        "0:45",
                    ),
                    variant(
                        "Video Viral: Kucing Lucu",
                        "https://picsum.photos/seed/tw2/640/360",
                        "1:30",
                    ),
                    variant(
                        "Breaking News Update",
                        "https://picsum.photos/seed/tw3/640/360",
                        "2:15",
                    ),
                ],
                options: &[
                    ("HD", "mp4", "18MB"),
                    ("SD", "mp4", "8MB"),
                    ("GIF", "gif", "5MB"),
                ],
            },
        ),
        (
            Platform::Facebook,
            MockEntry {
                variants: [
                    variant(
                        "Video Dokumenter: Keindahan Indonesia",
                        "https://picsum.photos/seed/fb1/640/360",
                        "15:30",
                    ),
                    variant(
                        "Live Stream: Konser Musik",
                        "https://picsum.photos/seed/fb2/640/360",
                        "1:45:00",
                    ),
                    variant(
                        "Reels: Tips Memasak",
                        "https://picsum.photos/seed/fb3/640/360",
                        "0:45",
                    ),
                ],
                options: &[
                    ("HD", "mp4", "180MB"),
                    ("SD", "mp4", "75MB"),
                    ("Audio Only", "mp3", "12MB"),
                ],
            },
        ),
        (
            Platform::SoundCloud,
            MockEntry {
                variants: [
                    variant(
                        "Mixtape: Chill Beats 2024",
                        "https://picsum.photos/seed/sc1/500/500",
                        "45:00",
                    ),
                    variant(
                        "Podcast: Teknologi Masa Depan",
                        "https://picsum.photos/seed/sc2/500/500",
                        "1:20:00",
                    ),
                    variant(
                        "Original Song - Indie Artist",
                        "https://picsum.photos/seed/sc3/500/500",
                        "3:45",
                    ),
                ],
                options: &[
                    ("320kbps", "mp3", "15MB"),
                    ("256kbps", "mp3", "12MB"),
                    ("128kbps", "mp3", "6MB"),
                ],
            },
        ),
        (
            Platform::Spotify,
            MockEntry {
                variants: [
                    variant(
                        "Top Hits Indonesia 2024",
                        "https://picsum.photos/seed/sp1/640/640",
                        "3:45",
                    ),
                    variant(
                        "Podcast: Motivasi Harian",
                        "https://picsum.photos/seed/sp2/640/640",
                        "25:00",
                    ),
                    variant(
                        "Album: Musik Relaksasi",
                        "https://picsum.photos/seed/sp3/640/640",
                        "4:30",
                    ),
                ],
                options: &[
                    ("High (320kbps)", "mp3", "8MB"),
                    ("Medium (160kbps)", "mp3", "4MB"),
                    ("Low (96kbps)", "mp3", "2MB"),
                ],
            },
        ),
        (
            Platform::Pinterest,
            MockEntry {
                variants: [
                    variant(
                        "DIY Home Decor Ideas",
                        "https://picsum.photos/seed/pi1/640/960",
                        "-",
                    ),
                    variant(
                        "Recipe: Healthy Smoothie Bowl",
                        "https://picsum.photos/seed/pi2/640/960",
                        "-",
                    ),
                    variant(
                        "Travel Photography Tips",
                        "https://picsum.photos/seed/pi3/640/960",
                        "-",
                    ),
                ],
                options: &[
                    ("Original", "png", "5MB"),
                    ("Large", "jpg", "2MB"),
                    ("Medium", "jpg", "500KB"),
                ],
            },
        ),
        (
            Platform::Vimeo,
            MockEntry {
                variants: [
                    variant(
                        "Short Film: The Journey",
                        "https://picsum.photos/seed/vm1/640/360",
                        "12:30",
                    ),
                    variant(
                        "Documentary: Ocean Life",
                        "https://picsum.photos/seed/vm2/640/360",
                        "45:00",
                    ),
                    variant(
                        "Music Video: Indie Band",
                        "https://picsum.photos/seed/vm3/640/360",
                        "4:15",
                    ),
                ],
                options: &[
                    ("4K", "mp4", "2GB"),
                    ("1080p", "mp4", "500MB"),
                    ("720p", "mp4", "250MB"),
                    ("SD", "mp4", "100MB"),
                ],
            },
        ),
        (
            Platform::Dailymotion,
            MockEntry {
                variants: [
                    variant(
                        "Gaming Highlights: Best Moments",
                        "https://picsum.photos/seed/dm1/640/360",
                        "8:45",
                    ),
                    variant(
                        "Music Cover: Popular Songs",
                        "https://picsum.photos/seed/dm2/640/360",
                        "5:30",
                    ),
                    variant(
                        "Vlog: Daily Life",
                        "https://picsum.photos/seed/dm3/640/360",
                        "15:00",
                    ),
                ],
                options: &[
                    ("1080p", "mp4", "200MB"),
                    ("720p", "mp4", "100MB"),
                    ("480p", "mp4", "50MB"),
                    ("Audio Only", "mp3", "10MB"),
                ],
            },
        ),
    ])
});

pub fn lookup(platform: Platform) -> Option<&'static MockEntry> {
    CATALOG.get(&platform)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_platform_has_an_entry() {
        for platform in Platform::ALL {
            let entry = lookup(platform).unwrap_or_else(|| panic!("missing {platform}"));
            assert!(!entry.options.is_empty());
        }
    }

    #[test]
    fn mock_titles_are_kept_verbatim() {
        let youtube = lookup(Platform::YouTube).unwrap();
        assert_eq!(youtube.variants[1].title, "Tutorial React untuk Pemula - Lengkap");
        let spotify = lookup(Platform::Spotify).unwrap();
        assert_eq!(spotify.variants[0].title, "Top Hits Indonesia 2024");
        assert_eq!(spotify.variants[0].duration, "3:45");
        let pinterest = lookup(Platform::Pinterest).unwrap();
        assert!(pinterest.variants.iter().all(|variant| variant.duration == "-"));
    }

    #[test]
    fn fixed_picker_clamps_to_last_variant() {
        assert_eq!(FixedPicker(1).pick(3), 1);
        assert_eq!(FixedPicker(7).pick(3), 2);
        assert_eq!(FixedPicker(0).pick(0), 0);
    }

    #[test]
    fn random_picker_stays_in_range() {
        for _ in 0..100 {
            assert!(RandomPicker.pick(3) < 3);
        }
        assert_eq!(RandomPicker.pick(0), 0);
    }

    #[test]
    fn mock_options_carry_no_source_url() {
        let options = lookup(Platform::TikTok).unwrap().download_options();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].quality, "No Watermark");
        assert_eq!(options[2].format, "mp3");
        assert!(options.iter().all(|option| option.url.is_none()));
    }
}
