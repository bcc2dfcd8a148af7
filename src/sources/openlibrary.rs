//! Open Library catalog implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::Config;
use crate::models::{AuthorRef, CoverId, ResultSet, SearchQuery, WorkDetail, WorkSummary};
use crate::sources::{CatalogError, CatalogSource};
use crate::utils::HttpClient;

/// Open Library catalog
///
/// Uses the subjects API for searching and the works API for details.
#[derive(Debug, Clone)]
pub struct OpenLibrarySource {
    client: HttpClient,
    base_url: String,
}

impl OpenLibrarySource {
    /// Create a source from configuration
    pub fn new(config: &Config) -> Result<Self, CatalogError> {
        let client = HttpClient::from_config(config)?;
        Ok(Self::with_client(client, &config.api_base_url))
    }

    /// Create a source sharing an existing client
    pub fn with_client(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build request URL
    fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Parse one work from the subjects response
    fn parse_work(data: OLWork) -> WorkSummary {
        let cover = CoverId::select(data.cover_id, data.cover_edition_key.as_deref());
        let title = data
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        WorkSummary {
            key: data.key.unwrap_or_default(),
            title,
            cover,
            authors: data
                .authors
                .into_iter()
                .map(|a| AuthorRef {
                    key: a.key,
                    name: a.name,
                })
                .collect(),
            first_publish_year: data.first_publish_year,
        }
    }
}

#[async_trait]
impl CatalogSource for OpenLibrarySource {
    fn name(&self) -> &str {
        "Open Library"
    }

    async fn search_works(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<ResultSet, CatalogError> {
        let url = self.build_url(&format!("/subjects/{}.json", query.path_segment()));
        tracing::debug!(url = %url, limit, "Searching subject");

        let response = self
            .client
            .client()
            .get(&url)
            .query(&[("limit", limit.to_string()), ("offset", "0".to_string())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Subject search failed");
            return Err(CatalogError::from_status(status, &url));
        }

        let data: SubjectResponse = response.json().await?;
        tracing::debug!(
            requested = limit,
            received = data.works.len(),
            work_count = ?data.work_count,
            "Subject search returned"
        );

        if data.works.is_empty() {
            return Err(CatalogError::Empty);
        }

        let works = data.works.into_iter().map(Self::parse_work).collect();
        let mut results = ResultSet::capped(works, limit);
        results.total = data.work_count;
        Ok(results)
    }

    async fn fetch_work_detail(&self, key: &str) -> Result<WorkDetail, CatalogError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CatalogError::NotFound("work has no catalog key".to_string()));
        }

        let url = self.build_url(&format!("{}.json", key));
        tracing::debug!(url = %url, "Fetching work detail");

        let response = self.client.client().get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Work detail failed");
            return Err(CatalogError::from_status(status, &url));
        }

        let raw: serde_json::Value = response.json().await?;
        Ok(WorkDetail::new(key, raw))
    }
}

// ===== Open Library API Types =====

#[derive(Debug, Deserialize)]
struct SubjectResponse {
    #[serde(default)]
    work_count: Option<usize>,
    #[serde(default)]
    works: Vec<OLWork>,
}

#[derive(Debug, Deserialize)]
struct OLWork {
    key: Option<String>,
    title: Option<String>,
    cover_id: Option<i64>,
    cover_edition_key: Option<String>,
    #[serde(default)]
    authors: Vec<OLAuthor>,
    first_publish_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OLAuthor {
    key: Option<String>,
    name: Option<String>,
}
