//! Documentation fetching
//!
//! URLs are fetched over HTTP (HTML converted to markdown, JSON pretty-printed);
//! `file` entries are read from disk relative to the template directory.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{DocumentError, EnrichError};
use crate::template::DocumentationRef;

/// Longest document body handed to the analysis prompt, in characters
pub const MAX_DOCUMENT_CHARS: usize = 50_000;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every documentation request
pub const USER_AGENT: &str = "specialist/0.1 (documentation enrichment)";

/// Produces the text of one documentation entry
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch `doc`; relative file locations resolve against `base_dir`
    async fn fetch(&self, doc: &DocumentationRef, base_dir: &Path) -> Result<String, DocumentError>;
}

/// Fetches `url` entries with reqwest and reads `file` entries from disk
pub struct HttpFileFetcher {
    client: reqwest::Client,
}

impl HttpFileFetcher {
    pub fn new() -> Result<Self, EnrichError> {
        debug!("HttpFileFetcher::new: called");
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_url(&self, url: &str) -> Result<String, DocumentError> {
        debug!(%url, "HttpFileFetcher::fetch_url: called");
        let response = self.client.get(url).send().await.map_err(|e| DocumentError::Fetch {
            location: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocumentError::Status {
                location: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response.text().await.map_err(|e| DocumentError::Fetch {
            location: url.to_string(),
            message: e.to_string(),
        })?;
        debug!(%content_type, body_len = body.len(), "HttpFileFetcher::fetch_url: body read");

        let content = if content_type.contains("text/html") || content_type.contains("application/xhtml") {
            html2md::rewrite_html(&body, false)
        } else if content_type.contains("application/json") {
            match serde_json::from_str::<Value>(&body) {
                Ok(json) => serde_json::to_string_pretty(&json).unwrap_or(body),
                Err(_) => body,
            }
        } else {
            body
        };
        Ok(content)
    }

    async fn read_file(&self, location: &str, base_dir: &Path) -> Result<String, DocumentError> {
        let path = base_dir.join(location);
        debug!(?path, "HttpFileFetcher::read_file: called");
        tokio::fs::read_to_string(&path).await.map_err(|e| DocumentError::Fetch {
            location: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[async_trait]
impl DocumentFetcher for HttpFileFetcher {
    async fn fetch(&self, doc: &DocumentationRef, base_dir: &Path) -> Result<String, DocumentError> {
        let content = match doc.doc_type.as_str() {
            "file" => self.read_file(&doc.location, base_dir).await?,
            _ if is_url(&doc.location) => self.fetch_url(&doc.location).await?,
            _ => self.read_file(&doc.location, base_dir).await?,
        };

        if content.trim().is_empty() {
            return Err(DocumentError::Empty(doc.location.clone()));
        }
        Ok(content)
    }
}

/// Cut `content` to at most `max` characters, marking the cut
pub fn truncate_document(content: &str, max: usize) -> String {
    match content.char_indices().nth(max) {
        Some((byte, _)) => format!(
            "{}...\n\n[truncated, {} chars total]",
            &content[..byte],
            content.chars().count()
        ),
        None => content.to_string(),
    }
}
