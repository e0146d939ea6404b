//! Attribute rewriting pass over a parsed document tree.
use html5ever::tendril::StrTendril;
use html5ever::Attribute;
use markup5ever_rcdom::{Handle, NodeData};
use mirror_logging::{mirror_debug, mirror_warn};
use url::Url;

use crate::config::MEDIA_SUFFIXES;
use crate::paths;
use crate::{ReferenceOutcome, ResolveError, RewriteReport};

/// Attribute keys (matched case-insensitively) that may hold a resource reference.
pub const RESOURCE_ATTRIBUTES: [&str; 2] = ["src", "href"];

// Relative references are validated against this base; it is never fetched.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Maps a remote resource to the value its attribute should be rewritten to.
pub trait ResourceResolver {
    fn resolve(&self, url: &Url) -> Result<String, ResolveError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("malformed reference {value:?}: {source}")]
    MalformedUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

enum Reference {
    Absolute(Url),
    /// No scheme; carries the reference joined onto [`RELATIVE_BASE`].
    Relative(Url),
    /// Well-formed syntax whose host or port can never be reached.
    Unreachable { path: String },
}

impl Reference {
    fn parse(value: &str) -> Result<Self, url::ParseError> {
        match Url::parse(value) {
            Ok(url) => Ok(Reference::Absolute(url)),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse(RELATIVE_BASE)?.join(value).map(Reference::Relative)
            }
            Err(
                url::ParseError::EmptyHost
                | url::ParseError::InvalidPort
                | url::ParseError::InvalidIpv4Address
                | url::ParseError::IdnaError,
            ) => Ok(Reference::Unreachable {
                path: raw_path(value).to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    fn path(&self) -> &str {
        match self {
            Reference::Absolute(url) | Reference::Relative(url) => url.path(),
            Reference::Unreachable { path } => path,
        }
    }
}

/// Path component of an absolute reference, read without validating the authority.
fn raw_path(value: &str) -> &str {
    let value = value
        .split_once(['?', '#'])
        .map_or(value, |(before, _)| before);
    let Some((_, rest)) = value.split_once("://") else {
        return "";
    };
    rest.find('/').map_or("", |start| &rest[start..])
}

pub struct TreeRewriter {
    media_suffixes: Vec<String>,
}

impl TreeRewriter {
    pub fn new(media_suffixes: Vec<String>) -> Self {
        Self {
            media_suffixes: media_suffixes
                .into_iter()
                .map(|suffix| suffix.to_lowercase())
                .collect(),
        }
    }

    /// Rewrite every candidate reference under `root` in document order.
    ///
    /// Only a reference that cannot be parsed at all aborts the pass; failed
    /// resolutions are recorded in the report and leave the attribute as is.
    pub fn rewrite(
        &self,
        root: &Handle,
        resolver: &dyn ResourceResolver,
    ) -> Result<RewriteReport, RewriteError> {
        let mut report = RewriteReport::default();
        self.visit(root, resolver, &mut report)?;
        Ok(report)
    }

    pub fn is_candidate(&self, path: &str) -> bool {
        let path = paths::decode_path(path).to_lowercase();
        self.media_suffixes
            .iter()
            .any(|suffix| path.ends_with(suffix.as_str()))
    }

    fn visit(
        &self,
        node: &Handle,
        resolver: &dyn ResourceResolver,
        report: &mut RewriteReport,
    ) -> Result<(), RewriteError> {
        if let NodeData::Element {
            attrs,
            template_contents,
            ..
        } = &node.data
        {
            for attr in attrs.borrow_mut().iter_mut() {
                self.rewrite_attribute(attr, resolver, report)?;
            }
            if let Some(contents) = template_contents.borrow().as_ref() {
                self.visit(contents, resolver, report)?;
            }
        }

        for child in node.children.borrow().iter() {
            self.visit(child, resolver, report)?;
        }
        Ok(())
    }

    fn rewrite_attribute(
        &self,
        attr: &mut Attribute,
        resolver: &dyn ResourceResolver,
        report: &mut RewriteReport,
    ) -> Result<(), RewriteError> {
        let key: &str = &attr.name.local;
        if !RESOURCE_ATTRIBUTES
            .iter()
            .any(|name| name.eq_ignore_ascii_case(key))
        {
            return Ok(());
        }

        let original = attr.value.to_string();
        let reference =
            Reference::parse(&original).map_err(|source| RewriteError::MalformedUrl {
                value: original.clone(),
                source,
            })?;
        if !self.is_candidate(reference.path()) {
            return Ok(());
        }

        let resolved = match reference {
            Reference::Absolute(url) => resolver.resolve(&url),
            Reference::Relative(_) => Err(ResolveError::NotRemote {
                url: original.clone(),
            }),
            Reference::Unreachable { .. } => Err(ResolveError::InvalidUrl {
                url: original.clone(),
            }),
        };

        match resolved {
            Ok(local) => {
                mirror_debug!("rewrote {} -> {}", original, local);
                attr.value = StrTendril::from_slice(&local);
                report
                    .outcomes
                    .push(ReferenceOutcome::Rewritten { original, local });
            }
            Err(error) => {
                mirror_warn!("leaving {} unchanged: {}", original, error);
                report
                    .outcomes
                    .push(ReferenceOutcome::Failed { original, error });
            }
        }
        Ok(())
    }
}

impl Default for TreeRewriter {
    fn default() -> Self {
        Self::new(MEDIA_SUFFIXES.iter().map(|s| s.to_string()).collect())
    }
}
