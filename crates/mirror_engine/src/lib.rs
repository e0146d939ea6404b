//! Mirror engine: localizes the media referenced by a tree of HTML documents.
mod cache;
mod codec;
mod config;
mod decode;
mod driver;
mod fetch;
mod pacing;
mod paths;
mod persist;
mod pipeline;
mod rewrite;
mod types;

pub use cache::{mirror_entry, MirrorCache, MirrorEntry, EXTERN_DIR};
pub use codec::{CodecError, Html5everCodec, MarkupCodec};
pub use config::{MirrorConfig, DOCUMENT_SUFFIX, MEDIA_SUFFIXES, OUTPUT_BASE};
pub use decode::{decode_document, DecodeError, DecodedDocument};
pub use driver::{MirrorDriver, MirrorError};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use pacing::Pacer;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{DocumentError, DocumentErrorKind, DocumentPipeline};
pub use rewrite::{ResourceResolver, RewriteError, TreeRewriter, RESOURCE_ATTRIBUTES};
pub use types::{
    Downloaded, FailureKind, FetchError, MirrorSummary, ReferenceOutcome, ResolveError,
    RewriteReport,
};
