//! Search orchestration.
//!
//! [`SearchOrchestrator::search`] runs one search end to end:
//!
//! 1. validate and normalize the input,
//! 2. fetch the subject from the catalog,
//! 3. build every card concurrently and wait for all of them,
//! 4. commit the cards (or the failure) to the shared [`SearchState`].
//!
//! Searches are never cancelled. Each one takes a generation number when it
//! starts, and only the latest generation may commit; a slower, older search
//! that finishes afterwards is discarded.

pub mod card;
pub mod state;

pub use card::{build_card, cover_url, Activation, CoverState, Key, RenderedCard};
pub use state::{LoadingState, RenderContainer, SearchEvent, SearchState, Transition};

use futures_util::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::models::{ResultSet, SearchQuery};
use crate::sources::{
    CatalogError, CatalogSource, CoverLoader, HttpCoverLoader, OpenLibrarySource,
};
use crate::utils::HttpClient;

/// Phases a single search passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Idle,
    Validating,
    Fetching,
    Empty,
    Failed,
    BuildingCards,
    Rendering,
}

impl SearchPhase {
    /// Whether `next` may follow `self`
    pub fn can_advance_to(self, next: SearchPhase) -> bool {
        use SearchPhase::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Fetching)
                | (Validating, Failed)
                | (Fetching, Empty)
                | (Fetching, Failed)
                | (Fetching, BuildingCards)
                | (Empty, Failed)
                | (BuildingCards, Rendering)
                | (Rendering, Idle)
                | (Failed, Idle)
        )
    }
}

/// Why a search did not render
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The query was empty after trimming
    #[error("Please enter a search term!")]
    Validation,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl SearchError {
    /// The plain-text message shown on the indicator
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Validation => self.to_string(),
            SearchError::Catalog(err) => err.user_message(),
        }
    }
}

/// How a search ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    /// Cards were committed to the container
    Rendered { cards: usize },
    /// The failure was committed to the indicator
    Failed(SearchError),
    /// A newer search started first; nothing was committed
    Stale,
}

/// Result of one [`SearchOrchestrator::search`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub generation: u64,
    pub status: SearchStatus,
    /// Every phase visited, starting at `Idle`
    pub phases: Vec<SearchPhase>,
}

impl SearchOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self.status, SearchStatus::Rendered { .. })
    }

    /// The user-facing failure message, if the search failed
    pub fn error_message(&self) -> Option<String> {
        match &self.status {
            SearchStatus::Failed(err) => Some(err.user_message()),
            _ => None,
        }
    }
}

/// Records the phases of one search and logs each transition
#[derive(Debug)]
struct PhaseTrail {
    generation: u64,
    phases: Vec<SearchPhase>,
}

impl PhaseTrail {
    fn new(generation: u64) -> Self {
        Self {
            generation,
            phases: vec![SearchPhase::Idle],
        }
    }

    fn current(&self) -> SearchPhase {
        self.phases.last().copied().unwrap_or(SearchPhase::Idle)
    }

    fn advance(&mut self, next: SearchPhase) {
        let current = self.current();
        debug_assert!(
            current.can_advance_to(next),
            "invalid search transition {:?} -> {:?}",
            current,
            next
        );
        tracing::debug!(generation = self.generation, from = ?current, to = ?next, "Search phase");
        self.phases.push(next);
    }

    fn finish(mut self, status: SearchStatus) -> SearchOutcome {
        self.advance(SearchPhase::Idle);
        SearchOutcome {
            generation: self.generation,
            status,
            phases: self.phases,
        }
    }
}

/// Drives searches against a catalog and commits them to shared state
#[derive(Debug)]
pub struct SearchOrchestrator {
    catalog: Arc<dyn CatalogSource>,
    cover_loader: Arc<dyn CoverLoader>,
    config: Config,
    state: Arc<Mutex<SearchState>>,
    generation: AtomicU64,
}

impl SearchOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        cover_loader: Arc<dyn CoverLoader>,
        config: Config,
    ) -> Self {
        Self {
            catalog,
            cover_loader,
            config,
            state: Arc::new(Mutex::new(SearchState::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Build an orchestrator talking to Open Library, sharing one HTTP client
    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        let client = HttpClient::from_config(config)?;
        let catalog = OpenLibrarySource::with_client(client.clone(), &config.api_base_url);
        let covers = HttpCoverLoader::new(client);
        Ok(Self::new(Arc::new(catalog), Arc::new(covers), config.clone()))
    }

    /// The catalog searches run against
    pub fn catalog(&self) -> Arc<dyn CatalogSource> {
        Arc::clone(&self.catalog)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A copy of the current indicator and container
    pub async fn snapshot(&self) -> SearchState {
        self.state.lock().await.clone()
    }

    /// Run one search for `input`
    ///
    /// Failures never propagate: they are committed to the indicator and
    /// reported in the returned outcome.
    ///
    /// The error indicator is reverted by a task on the current Tokio
    /// runtime. Outside a runtime the search still completes, but an error
    /// stays on the indicator until the next search.
    pub async fn search(&self, input: &str) -> SearchOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut trail = PhaseTrail::new(generation);
        self.commit(SearchEvent::Started { generation }).await;

        trail.advance(SearchPhase::Validating);
        let Some(query) = SearchQuery::parse(input) else {
            trail.advance(SearchPhase::Failed);
            return self.fail(trail, SearchError::Validation).await;
        };

        trail.advance(SearchPhase::Fetching);
        let max_results = self.config.max_results;
        let results = match self.catalog.search_works(&query, max_results).await {
            Ok(results) => results,
            Err(CatalogError::Empty) => {
                trail.advance(SearchPhase::Empty);
                trail.advance(SearchPhase::Failed);
                return self.fail(trail, CatalogError::Empty.into()).await;
            }
            Err(err) => {
                trail.advance(SearchPhase::Failed);
                return self.fail(trail, err.into()).await;
            }
        };
        tracing::info!(
            generation,
            query = %query.normalized,
            works = results.len(),
            "Search returned works"
        );

        trail.advance(SearchPhase::BuildingCards);
        let cards = self.build_cards(results, max_results).await;
        let count = cards.len();

        trail.advance(SearchPhase::Rendering);
        let status = match self
            .commit(SearchEvent::Rendered { generation, cards })
            .await
        {
            Transition::Applied => SearchStatus::Rendered { cards: count },
            Transition::Stale => {
                tracing::warn!(generation, "Discarding results of superseded search");
                SearchStatus::Stale
            }
        };
        trail.finish(status)
    }

    /// Fan out one card build per work and join them in response order
    async fn build_cards(
        &self,
        results: ResultSet,
        max_results: usize,
    ) -> Vec<RenderedCard> {
        let loader = self.cover_loader.as_ref();
        let covers = &self.config.covers;

        let builds = results
            .into_works()
            .into_iter()
            .take(max_results)
            .enumerate()
            .map(|(position, work)| build_card(work, position, loader, covers));

        join_all(builds).await
    }

    async fn fail(&self, trail: PhaseTrail, error: SearchError) -> SearchOutcome {
        let generation = trail.generation;
        let message = error.user_message();
        tracing::warn!(generation, error = %error, "Search failed");

        let status = match self
            .commit(SearchEvent::Failed {
                generation,
                message,
            })
            .await
        {
            Transition::Applied => {
                self.schedule_error_expiry(generation);
                SearchStatus::Failed(error)
            }
            Transition::Stale => SearchStatus::Stale,
        };
        trail.finish(status)
    }

    fn schedule_error_expiry(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let delay = self.config.display.error_display();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(generation, "No Tokio runtime, error indicator will not expire");
            return;
        };

        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut guard = state.lock().await;
            let (next, _) =
                std::mem::take(&mut *guard).apply(SearchEvent::ErrorExpired { generation });
            *guard = next;
        });
    }

    async fn commit(&self, event: SearchEvent) -> Transition {
        let mut guard = self.state.lock().await;
        let (next, transition) = std::mem::take(&mut *guard).apply(event);
        *guard = next;
        transition
    }
}
