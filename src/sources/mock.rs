//! Mock catalog and cover loader for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::models::{ResultSet, SearchQuery, WorkDetail, WorkSummary};
use crate::sources::{CatalogError, CatalogSource, CoverError, CoverImage, CoverLoader};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
struct Scripted<T> {
    result: Result<T, CatalogError>,
    delay: Duration,
}

/// A mock catalog that returns predefined responses.
///
/// Responses can be scripted per normalized query; anything unscripted falls
/// back to the default response, which is [`CatalogError::Empty`] until set.
#[derive(Debug, Default)]
pub struct MockCatalog {
    default_search: Mutex<Option<Scripted<Vec<WorkSummary>>>>,
    per_query: Mutex<HashMap<String, Scripted<Vec<WorkSummary>>>>,
    detail: Mutex<Option<Scripted<serde_json::Value>>>,
    search_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl MockCatalog {
    /// Create a new mock catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the works returned for any query.
    pub fn set_search_response(&self, works: Vec<WorkSummary>) {
        *lock(&self.default_search) = Some(Scripted {
            result: Ok(works),
            delay: Duration::ZERO,
        });
    }

    /// Make every unscripted search fail.
    pub fn set_search_error(&self, error: CatalogError) {
        *lock(&self.default_search) = Some(Scripted {
            result: Err(error),
            delay: Duration::ZERO,
        });
    }

    /// Script the works returned for one normalized query, after `delay`.
    pub fn script_query(&self, normalized: &str, works: Vec<WorkSummary>, delay: Duration) {
        lock(&self.per_query).insert(
            normalized.to_string(),
            Scripted {
                result: Ok(works),
                delay,
            },
        );
    }

    /// Set the detail body returned for any key.
    pub fn set_detail_response(&self, body: serde_json::Value) {
        self.set_detail_response_after(body, Duration::ZERO);
    }

    /// Set the detail body, returned after `delay`.
    pub fn set_detail_response_after(&self, body: serde_json::Value, delay: Duration) {
        *lock(&self.detail) = Some(Scripted {
            result: Ok(body),
            delay,
        });
    }

    /// Make every detail fetch fail.
    pub fn set_detail_error(&self, error: CatalogError) {
        *lock(&self.detail) = Some(Scripted {
            result: Err(error),
            delay: Duration::ZERO,
        });
    }

    /// Number of `search_works` calls so far.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of `fetch_work_detail` calls so far.
    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    fn name(&self) -> &str {
        "Mock Catalog"
    }

    async fn search_works(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<ResultSet, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        let scripted = lock(&self.per_query)
            .get(&query.normalized)
            .cloned()
            .or_else(|| lock(&self.default_search).clone());

        let Some(scripted) = scripted else {
            return Err(CatalogError::Empty);
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }

        let works = scripted.result?;
        if works.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(ResultSet::capped(works, limit))
    }

    async fn fetch_work_detail(&self, key: &str) -> Result<WorkDetail, CatalogError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        let scripted = lock(&self.detail).clone();
        let Some(scripted) = scripted else {
            return Err(CatalogError::NotFound(key.to_string()));
        };

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }

        Ok(WorkDetail::new(key, scripted.result?))
    }
}

/// How the mock cover loader treats one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverBehavior {
    /// Load immediately
    Load,
    /// Fail immediately
    Fail,
    /// Load after a delay
    Delay(Duration),
    /// Never load and never fail
    Hang,
}

/// A mock cover loader with per-URL behavior.
#[derive(Debug)]
pub struct MockCoverLoader {
    default: CoverBehavior,
    per_url: Mutex<HashMap<String, CoverBehavior>>,
    requested: Mutex<Vec<String>>,
}

impl Default for MockCoverLoader {
    fn default() -> Self {
        Self::new(CoverBehavior::Load)
    }
}

impl MockCoverLoader {
    /// Create a loader applying `default` to every unscripted URL.
    pub fn new(default: CoverBehavior) -> Self {
        Self {
            default,
            per_url: Mutex::new(HashMap::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Override the behavior for one URL.
    pub fn set(&self, url: &str, behavior: CoverBehavior) {
        lock(&self.per_url).insert(url.to_string(), behavior);
    }

    /// URLs requested so far, in request order.
    pub fn requested(&self) -> Vec<String> {
        lock(&self.requested).clone()
    }
}

#[async_trait]
impl CoverLoader for MockCoverLoader {
    async fn load(&self, url: &str) -> Result<CoverImage, CoverError> {
        lock(&self.requested).push(url.to_string());
        let behavior = lock(&self.per_url).get(url).copied().unwrap_or(self.default);

        match behavior {
            CoverBehavior::Load => {}
            CoverBehavior::Fail => return Err(CoverError::Status(404)),
            CoverBehavior::Delay(delay) => tokio::time::sleep(delay).await,
            CoverBehavior::Hang => std::future::pending::<()>().await,
        }

        Ok(CoverImage {
            url: url.to_string(),
            bytes: 1024,
            content_type: Some("image/jpeg".to_string()),
        })
    }
}

/// Helper function to create a mock work for testing.
pub fn make_work(id: usize, title: &str) -> WorkSummary {
    WorkSummary::new(format!("/works/OL{}W", id), title)
}
