use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::FetchSettings;

pub const OUTPUT_BASE: &str = "out";
pub const DOCUMENT_SUFFIX: &str = ".html";

/// Path suffixes (lower case) that mark a reference as a media resource.
pub const MEDIA_SUFFIXES: [&str; 12] = [
    ".jpeg", ".jpg", ".png", ".tif", ".tiff", ".hiec", ".mp4", ".avif", ".mpeg", ".mpg", ".mp3",
    ".gif",
];

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Root of the output tree; mirrored resources live under `extern/`.
    pub output_base: PathBuf,
    pub document_suffix: String,
    pub media_suffixes: Vec<String>,
    /// Pause after each successful download.
    pub politeness_delay: Duration,
    pub fetch: FetchSettings,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            output_base: PathBuf::from(OUTPUT_BASE),
            document_suffix: DOCUMENT_SUFFIX.to_string(),
            media_suffixes: MEDIA_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            politeness_delay: Duration::from_secs(1),
            fetch: FetchSettings::default(),
        }
    }
}
