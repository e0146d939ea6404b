//! Content-addressed mirror of remote resources under `<output_base>/extern/`.
//!
//! A resource's local path is derived only from the URL authority and its
//! cleaned path, so presence on disk is the whole cache index: a file that
//! already exists is never fetched again.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use mirror_logging::{mirror_debug, mirror_info};
use tempfile::Builder;
use url::Url;

use crate::fetch::Fetcher;
use crate::pacing::Pacer;
use crate::paths;
use crate::rewrite::ResourceResolver;
use crate::ResolveError;

pub const EXTERN_DIR: &str = "extern";
const TEMP_PREFIX: &str = "download_tmp_";

/// Where a remote resource lives locally, and how documents refer to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEntry {
    pub local_path: PathBuf,
    /// `/extern/<authority>/<path>`, relative to the output root.
    pub root_relative: String,
}

/// Compute the mirror entry for `url` without touching the filesystem.
pub fn mirror_entry(output_base: &Path, url: &Url) -> Result<MirrorEntry, ResolveError> {
    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| ResolveError::NotRemote {
            url: url.to_string(),
        })?;
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let cleaned = paths::clean(&paths::decode_path(url.path()));
    // Advisory check only, not a security boundary.
    if cleaned.contains("..") {
        return Err(ResolveError::InvalidUrl {
            url: url.to_string(),
        });
    }

    let local_path = output_base
        .join(EXTERN_DIR)
        .join(&authority)
        .join(cleaned.trim_start_matches('/'));
    let root_relative = format!(
        "/{EXTERN_DIR}/{authority}{}",
        paths::encode_segments(&cleaned)
    );

    Ok(MirrorEntry {
        local_path,
        root_relative,
    })
}

pub struct MirrorCache {
    output_base: PathBuf,
    fetcher: Box<dyn Fetcher>,
    runtime: tokio::runtime::Runtime,
    pacer: Pacer,
}

impl MirrorCache {
    pub fn new(
        output_base: impl Into<PathBuf>,
        fetcher: Box<dyn Fetcher>,
        pacer: Pacer,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            output_base: output_base.into(),
            fetcher,
            runtime,
            pacer,
        })
    }

    pub fn entry_for(&self, url: &Url) -> Result<MirrorEntry, ResolveError> {
        mirror_entry(&self.output_base, url)
    }

    /// Mirror `url` if needed and return its root-relative local path.
    pub fn resolve(&self, url: &Url) -> Result<String, ResolveError> {
        let entry = self.entry_for(url)?;

        if entry.local_path.exists() {
            mirror_debug!("cached {} at {}", url, entry.local_path.display());
            return Ok(entry.root_relative);
        }

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ResolveError::NotRemote {
                url: url.to_string(),
            });
        }

        if let Some(parent) = entry.local_path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.download_to(url, &entry.local_path)?;
        self.pacer.pace();

        Ok(entry.root_relative)
    }

    fn download_to(&self, url: &Url, dest: &Path) -> Result<(), ResolveError> {
        mirror_info!("{} -> {}", url, dest.display());

        // Removed on drop unless persisted below.
        let mut tmp = Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.output_base)?;

        let downloaded = self
            .runtime
            .block_on(self.fetcher.download(url, tmp.as_file_mut()))?;
        tmp.flush()?;
        mirror_info!(
            "{}: status {}, {} bytes",
            url,
            downloaded.status,
            downloaded.bytes_written
        );

        if let Some(expected) = downloaded.declared_length {
            if expected != downloaded.bytes_written {
                return Err(ResolveError::ContentLengthMismatch {
                    expected,
                    actual: downloaded.bytes_written,
                });
            }
        }

        tmp.persist(dest).map_err(|err| ResolveError::Io(err.error))?;
        Ok(())
    }
}

impl ResourceResolver for MirrorCache {
    fn resolve(&self, url: &Url) -> Result<String, ResolveError> {
        MirrorCache::resolve(self, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str) -> Result<MirrorEntry, ResolveError> {
        mirror_entry(Path::new("out"), &Url::parse(url).unwrap())
    }

    #[test]
    fn entry_is_host_plus_path() {
        let entry = entry("https://example.com/a/b.png").unwrap();
        assert_eq!(entry.local_path, PathBuf::from("out/extern/example.com/a/b.png"));
        assert_eq!(entry.root_relative, "/extern/example.com/a/b.png");
    }

    #[test]
    fn explicit_port_is_part_of_the_authority() {
        let entry = entry("http://127.0.0.1:8080/x.gif").unwrap();
        assert_eq!(entry.local_path, PathBuf::from("out/extern/127.0.0.1:8080/x.gif"));
        assert_eq!(entry.root_relative, "/extern/127.0.0.1:8080/x.gif");
    }

    #[test]
    fn query_and_fragment_do_not_change_the_entry() {
        assert_eq!(
            entry("https://h.test/a.png?size=large#top").unwrap(),
            entry("https://h.test/a.png").unwrap()
        );
    }

    #[test]
    fn hostless_url_is_not_remote() {
        assert!(matches!(
            entry("file:///srv/a.png"),
            Err(ResolveError::NotRemote { .. })
        ));
    }
}
