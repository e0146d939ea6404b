use std::fmt;
use std::io;

/// Result of a completed transfer: the body has been written to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Downloaded {
    pub status: u16,
    /// Length the server announced, if any.
    pub declared_length: Option<u64>,
    pub bytes_written: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    Network,
    Io,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Io => write!(f, "io error"),
        }
    }
}

/// Resource-level failure. Never aborts a document: the reference is left as is.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid download url {url}")]
    InvalidUrl { url: String },
    #[error("nothing to download for {url}: no remote host or unsupported scheme")]
    NotRemote { url: String },
    #[error("download failed: {0}")]
    Download(#[from] FetchError),
    #[error("content length mismatch ({actual} != {expected})")]
    ContentLengthMismatch { expected: u64, actual: u64 },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// What happened to one candidate reference during a rewrite pass.
#[derive(Debug)]
pub enum ReferenceOutcome {
    Rewritten { original: String, local: String },
    Failed { original: String, error: ResolveError },
}

/// Per-document record of every candidate reference, in document order.
#[derive(Debug, Default)]
pub struct RewriteReport {
    pub outcomes: Vec<ReferenceOutcome>,
}

impl RewriteReport {
    pub fn rewritten(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, ReferenceOutcome::Rewritten { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.rewritten()
    }
}

/// Totals for a whole mirror run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub documents: usize,
    pub rewritten: usize,
    pub failed: usize,
}

impl MirrorSummary {
    pub(crate) fn record(&mut self, report: &RewriteReport) {
        self.documents += 1;
        self.rewritten += report.rewritten();
        self.failed += report.failed();
    }
}
