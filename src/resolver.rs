//! Chooses between a live endpoint and a persisted snapshot for a document.
//!
//! The resolver is the only core component permitted to perform I/O. It
//! tries the preferred source first and falls back to the other
//! sequentially; the two are never raced. When both fail the caller gets a
//! single error naming both attempted sources, so "no data" is always
//! distinguishable from an empty-but-valid run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use miette::Diagnostic;
use reqwest::Client;
use thiserror::Error;

use crate::document::GraphDocument;

/// A single-attempt failure from one source.
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    /// Network-level failure, including external cancellation of the fetch.
    #[error("request failed: {0}")]
    #[diagnostic(code(tracegraph::resolver::transport))]
    Transport(#[from] reqwest::Error),

    /// The source answered with a non-success status.
    #[error("source returned status {status}")]
    #[diagnostic(code(tracegraph::resolver::status))]
    Status { status: u16 },

    /// No document exists for the subject at this source.
    #[error("no document found at {location}")]
    #[diagnostic(code(tracegraph::resolver::not_found))]
    NotFound { location: String },

    /// The body was not a parseable graph document.
    #[error("failed to decode graph document: {source}")]
    #[diagnostic(
        code(tracegraph::resolver::decode),
        help("the source returned a body that is not a valid graph document")
    )]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot file could not be read.
    #[error("failed to read snapshot: {source}")]
    #[diagnostic(code(tracegraph::resolver::io))]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Failure of a whole `resolve` call: both the preferred and the fallback
/// source failed.
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error("no source available for '{subject_id}': tried {preferred}, then {fallback}: {last}")]
    #[diagnostic(
        code(tracegraph::resolver::unavailable),
        help("check that the live endpoint is reachable or that a snapshot exists for the subject")
    )]
    Unavailable {
        subject_id: String,
        /// Description of the source attempted first.
        preferred: String,
        /// Description of the source attempted second.
        fallback: String,
        /// The error from the last attempt.
        #[source]
        last: SourceError,
    },
}

/// One origin a graph document can be fetched from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Fetches the latest document for a subject.
    async fn fetch(&self, subject_id: &str) -> Result<GraphDocument, SourceError>;

    /// Human-readable identifier used in resolution errors.
    fn describe(&self, subject_id: &str) -> String;
}

/// Live origin: `GET {base}/api/runs/{subject}/latest`.
#[derive(Clone, Debug)]
pub struct LiveEndpoint {
    base_url: String,
    client: Client,
}

impl LiveEndpoint {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Uses a caller-provided client, e.g. one with timeouts configured.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    fn url_for(&self, subject_id: &str) -> String {
        format!("{}/api/runs/{}/latest", self.base_url, subject_id)
    }
}

#[async_trait]
impl DocumentSource for LiveEndpoint {
    async fn fetch(&self, subject_id: &str) -> Result<GraphDocument, SourceError> {
        let url = self.url_for(subject_id);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status.as_u16() == 404 {
            return Err(SourceError::NotFound { location: url });
        }
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        GraphDocument::from_json_str(&body).map_err(|source| SourceError::Decode { source })
    }

    fn describe(&self, subject_id: &str) -> String {
        self.url_for(subject_id)
    }
}

/// Snapshot origin: `{root}/{subject}/graph.json` on the local filesystem.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The snapshot path for a subject.
    #[must_use]
    pub fn path_for(&self, subject_id: &str) -> PathBuf {
        self.root.join(subject_id).join("graph.json")
    }

    /// The store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DocumentSource for SnapshotStore {
    async fn fetch(&self, subject_id: &str) -> Result<GraphDocument, SourceError> {
        let path = self.path_for(subject_id);
        let body = match tokio::fs::read_to_string(&path).await {
            Ok(body) => body,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound {
                    location: path.display().to_string(),
                });
            }
            Err(err) => return Err(SourceError::Io { source: err }),
        };
        GraphDocument::from_json_str(&body).map_err(|source| SourceError::Decode { source })
    }

    fn describe(&self, subject_id: &str) -> String {
        self.path_for(subject_id).display().to_string()
    }
}

/// Resolves a graph document from a live source with snapshot fallback (or
/// the reverse, when `prefer_live` is false).
pub struct SourceResolver {
    live: Box<dyn DocumentSource>,
    snapshot: Box<dyn DocumentSource>,
}

impl SourceResolver {
    pub fn new(
        live: impl DocumentSource + 'static,
        snapshot: impl DocumentSource + 'static,
    ) -> Self {
        Self {
            live: Box::new(live),
            snapshot: Box::new(snapshot),
        }
    }

    /// Fetches a document for `subject_id`, preferred source first.
    ///
    /// Any failure of the preferred source (network, not-found, malformed
    /// body, cancellation) moves on to the fallback. Only when both fail
    /// does the call error, carrying the identifiers of both attempts and
    /// the error from the last one. An empty-but-valid document is a
    /// success, never converted to or from a failure.
    pub async fn resolve(
        &self,
        subject_id: &str,
        prefer_live: bool,
    ) -> Result<GraphDocument, ResolveError> {
        let (first, second) = if prefer_live {
            (&self.live, &self.snapshot)
        } else {
            (&self.snapshot, &self.live)
        };

        let first_err = match first.fetch(subject_id).await {
            Ok(doc) => return Ok(doc),
            Err(err) => err,
        };
        tracing::warn!(
            subject = subject_id,
            source = %first.describe(subject_id),
            error = %first_err,
            "preferred source failed, falling back"
        );

        match second.fetch(subject_id).await {
            Ok(doc) => Ok(doc),
            Err(last) => Err(ResolveError::Unavailable {
                subject_id: subject_id.to_string(),
                preferred: first.describe(subject_id),
                fallback: second.describe(subject_id),
                last,
            }),
        }
    }
}
