//! Catalog and cover sources behind async traits.
//!
//! This module defines the [`CatalogSource`] trait used by the search
//! orchestrator and the detail presenter, and the [`CoverLoader`] trait used
//! by the card builder to load cover images. The production implementations
//! talk to Open Library over HTTP; [`mock`] provides scripted versions for
//! tests.
//!
//! # Environment
//!
//! - `API_BASE_URL` - Catalog base URL (default: `https://openlibrary.org`)
//! - `API_TIMEOUT` - Request timeout in milliseconds (default: 15000)
//! - `COVERS_BASE_URL` - Cover image host (default: `https://covers.openlibrary.org`)

mod covers;
mod openlibrary;

pub mod mock;

pub use covers::{CoverImage, HttpCoverLoader};
pub use mock::{CoverBehavior, MockCatalog, MockCoverLoader};
pub use openlibrary::OpenLibrarySource;

use crate::models::{ResultSet, SearchQuery, WorkDetail};
use async_trait::async_trait;

/// The CatalogSource trait defines the two requests the application issues.
#[async_trait]
pub trait CatalogSource: Send + Sync + std::fmt::Debug {
    /// Human-readable name of this catalog
    fn name(&self) -> &str;

    /// Search works by subject, requesting at most `limit` results
    ///
    /// Fails with [`CatalogError::Empty`] when the catalog has no works for
    /// the subject.
    async fn search_works(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<ResultSet, CatalogError>;

    /// Fetch the extended detail of one work by its catalog key
    async fn fetch_work_detail(&self, key: &str) -> Result<WorkDetail, CatalogError>;
}

/// Loads a cover image, the way an image element would
#[async_trait]
pub trait CoverLoader: Send + Sync + std::fmt::Debug {
    /// Load the image at `url`
    ///
    /// Implementations may never return; callers bound the wait.
    async fn load(&self, url: &str) -> Result<CoverImage, CoverError>;
}

/// Errors that can occur when talking to the catalog
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The request timeout elapsed before a response arrived
    #[error("Request timed out")]
    Timeout,

    /// HTTP 404 for the given URL
    #[error("Request failed with status code 404")]
    NotFound(String),

    /// The connection could not be established
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The search succeeded but matched no works
    #[error("No works in response")]
    Empty,

    /// Any other non-success status
    #[error("{0}")]
    Api(String),

    /// The body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl CatalogError {
    /// The plain-text message shown to the user for this failure
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Timeout => "Server too slow. Please try again.".to_string(),
            CatalogError::NotFound(_) | CatalogError::Empty => {
                "No books found for this search.".to_string()
            }
            CatalogError::NetworkUnavailable(_) => "No internet connection.".to_string(),
            other => other.to_string(),
        }
    }

    /// Error for a non-success HTTP status
    pub fn from_status(status: reqwest::StatusCode, url: &str) -> Self {
        if status == reqwest::StatusCode::NOT_FOUND {
            CatalogError::NotFound(url.to_string())
        } else {
            CatalogError::Api(format!(
                "Request failed with status code {}",
                status.as_u16()
            ))
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout
        } else if err.is_connect() {
            CatalogError::NetworkUnavailable(err.to_string())
        } else if let Some(status) = err.status() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            CatalogError::from_status(status, &url)
        } else if err.is_decode() {
            CatalogError::Parse(err.to_string())
        } else {
            CatalogError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(format!("JSON: {}", err))
    }
}

/// Errors that can occur when loading a cover
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoverError {
    #[error("Failed to load cover: {0}")]
    Network(String),

    #[error("Cover returned status {0}")]
    Status(u16),

    #[error("Not an image: {0}")]
    NotAnImage(String),
}

impl From<reqwest::Error> for CoverError {
    fn from(err: reqwest::Error) -> Self {
        CoverError::Network(err.to_string())
    }
}
