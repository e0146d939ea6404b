use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mirror_logging::{mirror_debug, mirror_info};
use thiserror::Error;

use crate::codec::{CodecError, MarkupCodec};
use crate::decode::{decode_document, DecodeError};
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};
use crate::rewrite::{ResourceResolver, RewriteError, TreeRewriter};
use crate::RewriteReport;

#[derive(Debug, Error)]
#[error("cannot process {}: {source}", .path.display())]
pub struct DocumentError {
    pub path: PathBuf,
    #[source]
    pub source: DocumentErrorKind,
}

#[derive(Debug, Error)]
pub enum DocumentErrorKind {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Load, rewrite and store one document at a time.
///
/// Each call owns its document tree from parse to render; nothing is shared
/// between documents except the resolver.
pub struct DocumentPipeline {
    codec: Box<dyn MarkupCodec>,
    rewriter: TreeRewriter,
    resolver: Box<dyn ResourceResolver>,
}

impl DocumentPipeline {
    pub fn new(
        codec: Box<dyn MarkupCodec>,
        rewriter: TreeRewriter,
        resolver: Box<dyn ResourceResolver>,
    ) -> Self {
        Self {
            codec,
            rewriter,
            resolver,
        }
    }

    /// Rewrite `input_file` into `output_file`, which must be a child of `output_dir`.
    ///
    /// The output is only written once the whole document was rewritten, so a
    /// failure never leaves a partial file behind.
    pub fn process(
        &self,
        input_file: &Path,
        output_dir: &Path,
        output_file: &Path,
    ) -> Result<RewriteReport, DocumentError> {
        self.run(input_file, output_dir, output_file)
            .map_err(|source| DocumentError {
                path: input_file.to_path_buf(),
                source,
            })
    }

    fn run(
        &self,
        input_file: &Path,
        output_dir: &Path,
        output_file: &Path,
    ) -> Result<RewriteReport, DocumentErrorKind> {
        ensure_output_dir(output_dir)?;

        let bytes = fs::read(input_file)?;
        let decoded = decode_document(&bytes)?;
        mirror_debug!("{} decoded as {}", input_file.display(), decoded.encoding.name());
        let dom = self.codec.parse(&decoded.text)?;
        let report = self.rewriter.rewrite(&dom.document, self.resolver.as_ref())?;

        let mut rendered = Vec::with_capacity(bytes.len());
        self.codec.render(&dom, &mut rendered)?;
        let rendered = String::from_utf8(rendered)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        let encoded = decoded.encode(&rendered);

        let file_name = output_file.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name")
        })?;
        AtomicFileWriter::new(output_dir.to_path_buf()).write(file_name, &encoded)?;

        mirror_info!(
            "{} -> {} ({} rewritten, {} unchanged)",
            input_file.display(),
            output_file.display(),
            report.rewritten(),
            report.failed()
        );
        Ok(report)
    }
}
