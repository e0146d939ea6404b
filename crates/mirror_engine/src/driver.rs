use std::io;
use std::path::{Path, PathBuf};

use mirror_logging::mirror_debug;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::cache::MirrorCache;
use crate::codec::Html5everCodec;
use crate::config::MirrorConfig;
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::pacing::Pacer;
use crate::paths;
use crate::pipeline::{DocumentError, DocumentPipeline};
use crate::rewrite::TreeRewriter;
use crate::{FetchError, MirrorSummary};

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("cannot create http client: {0}")]
    Client(#[from] FetchError),
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Walks input trees and mirrors every document into the output base.
pub struct MirrorDriver {
    config: MirrorConfig,
    pipeline: DocumentPipeline,
}

impl MirrorDriver {
    pub fn new(config: MirrorConfig) -> Result<Self, MirrorError> {
        let fetcher = ReqwestFetcher::new(config.fetch.clone())?;
        Self::with_fetcher(config, Box::new(fetcher))
    }

    pub fn with_fetcher(
        config: MirrorConfig,
        fetcher: Box<dyn Fetcher>,
    ) -> Result<Self, MirrorError> {
        let cache = MirrorCache::new(
            config.output_base.clone(),
            fetcher,
            Pacer::new(config.politeness_delay),
        )?;
        let pipeline = DocumentPipeline::new(
            Box::new(Html5everCodec),
            TreeRewriter::new(config.media_suffixes.clone()),
            Box::new(cache),
        );
        Ok(Self::with_pipeline(config, pipeline))
    }

    pub fn with_pipeline(config: MirrorConfig, pipeline: DocumentPipeline) -> Self {
        Self { config, pipeline }
    }

    /// Mirror every root in order. The first failing document aborts the run.
    pub fn mirror<P: AsRef<Path>>(&self, roots: &[P]) -> Result<MirrorSummary, MirrorError> {
        let output_base = paths::absolutize(&self.config.output_base)?;
        let mut summary = MirrorSummary::default();
        for root in roots {
            self.mirror_root(root.as_ref(), &output_base, &mut summary)?;
        }
        Ok(summary)
    }

    fn mirror_root(
        &self,
        root: &Path,
        output_base: &Path,
        summary: &mut MirrorSummary,
    ) -> Result<(), MirrorError> {
        let root_abs = paths::absolutize(root)?;
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_output_tree(entry, output_base));

        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_dir() || !self.is_document(&entry) {
                continue;
            }
            let (output_dir, output_file) = self.output_paths(&root_abs, entry.path())?;
            let report = self
                .pipeline
                .process(entry.path(), &output_dir, &output_file)?;
            summary.record(&report);
        }
        Ok(())
    }

    fn is_document(&self, entry: &DirEntry) -> bool {
        entry
            .file_name()
            .as_encoded_bytes()
            .ends_with(self.config.document_suffix.as_bytes())
    }

    /// Output directory and file for `file`, mirroring its place under `root_abs`.
    fn output_paths(&self, root_abs: &Path, file: &Path) -> io::Result<(PathBuf, PathBuf)> {
        let file_abs = paths::absolutize(file)?;
        let relative = match file_abs.strip_prefix(root_abs) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
            // The root is the document itself.
            _ => PathBuf::from(file_abs.file_name().unwrap_or_default()),
        };

        let output_file = self.config.output_base.join(relative);
        let output_dir = output_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.output_base.clone());
        Ok((output_dir, output_file))
    }
}

fn is_output_tree(entry: &DirEntry, output_base: &Path) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let skip = paths::absolutize(entry.path()).is_ok_and(|path| path == output_base);
    if skip {
        mirror_debug!("skipping output tree {}", entry.path().display());
    }
    skip
}
