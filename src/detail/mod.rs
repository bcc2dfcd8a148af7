//! Detail presenter and its modal.
//!
//! There is exactly one modal. It is created the first time a card is
//! activated and reused afterwards. Every activation takes a token; only the
//! response of the latest activation is written into the modal body, so a
//! slow response for an earlier card never replaces a newer one.
//!
//! The modal lock is never held across the catalog request, so dismissal
//! stays responsive while a fetch is in flight. Dismissing does not cancel
//! the fetch: its response still lands in the (hidden) body.

pub mod fields;

pub use fields::{DetailView, Field};

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

use crate::search::Key;
use crate::sources::CatalogSource;
use crate::WorkSummary;

/// Title of the modal body when a detail fetch fails
pub const ERROR_TITLE: &str = "Error loading details";

/// What the modal currently shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModalBody {
    Loading,
    Details(DetailView),
    Error { title: String, message: String },
}

/// Gestures that dismiss the modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalEvent {
    CloseClicked,
    OutsideClicked,
    EscapePressed,
}

impl ModalEvent {
    /// Map a key press to a modal event; only Escape dismisses
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::Escape => Some(ModalEvent::EscapePressed),
            _ => None,
        }
    }
}

/// The singleton modal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modal {
    pub visible: bool,
    pub body: ModalBody,
    /// Token of the activation that owns the body
    pub activation: u64,
    /// Key of the work being shown
    pub work_key: String,
}

impl Modal {
    fn new() -> Self {
        tracing::debug!("Creating detail modal");
        Self {
            visible: false,
            body: ModalBody::Loading,
            activation: 0,
            work_key: String::new(),
        }
    }
}

/// Fetches a work's detail on activation and renders it into the modal
#[derive(Debug)]
pub struct DetailPresenter {
    catalog: Arc<dyn CatalogSource>,
    modal: OnceLock<Mutex<Modal>>,
    activations: AtomicU64,
}

impl DetailPresenter {
    pub fn new(catalog: Arc<dyn CatalogSource>) -> Self {
        Self {
            catalog,
            modal: OnceLock::new(),
            activations: AtomicU64::new(0),
        }
    }

    fn modal(&self) -> &Mutex<Modal> {
        self.modal.get_or_init(|| Mutex::new(Modal::new()))
    }

    /// Whether the modal has been created yet
    pub fn is_created(&self) -> bool {
        self.modal.get().is_some()
    }

    /// Open the modal for `work` and fill it with the fetched detail
    ///
    /// Returns the body this activation produced, whether or not it was
    /// still current when the response arrived.
    pub async fn activate(&self, work: &WorkSummary) -> ModalBody {
        let token = self.activations.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut modal = self.modal().lock().await;
            modal.visible = true;
            modal.body = ModalBody::Loading;
            modal.activation = token;
            modal.work_key = work.key.clone();
        }

        tracing::debug!(key = %work.key, activation = token, "Fetching work detail");
        let body = match self.catalog.fetch_work_detail(&work.key).await {
            Ok(detail) => ModalBody::Details(DetailView::resolve(work, &detail)),
            Err(err) => {
                tracing::warn!(key = %work.key, error = %err, "Failed to load work detail");
                ModalBody::Error {
                    title: ERROR_TITLE.to_string(),
                    message: err.to_string(),
                }
            }
        };

        let mut modal = self.modal().lock().await;
        if modal.activation == token {
            modal.body = body.clone();
        } else {
            tracing::debug!(
                activation = token,
                current = modal.activation,
                "Dropping detail of superseded activation"
            );
        }
        body
    }

    /// Hide the modal; returns false when it was not visible
    pub async fn dismiss(&self, event: ModalEvent) -> bool {
        let Some(modal) = self.modal.get() else {
            return false;
        };
        let mut modal = modal.lock().await;
        if !modal.visible {
            return false;
        }
        tracing::debug!(?event, "Dismissing detail modal");
        modal.visible = false;
        true
    }

    /// A copy of the modal, if it has been created
    pub async fn snapshot(&self) -> Option<Modal> {
        match self.modal.get() {
            Some(modal) => Some(modal.lock().await.clone()),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AuthorRef;
    use crate::sources::{CatalogError, MockCatalog};
    use serde_json::json;
    use std::time::Duration;

    fn dune() -> WorkSummary {
        WorkSummary::new("/works/OL893415W", "Dune")
            .author(AuthorRef::named("Frank Herbert"))
            .first_publish_year(1965)
    }

    #[tokio::test]
    async fn test_modal_created_lazily() {
        let catalog = Arc::new(MockCatalog::new());
        let presenter = DetailPresenter::new(catalog);

        assert!(!presenter.is_created());
        assert!(presenter.snapshot().await.is_none());
        assert!(!presenter.dismiss(ModalEvent::EscapePressed).await);
        assert!(!presenter.is_created());
    }

    #[tokio::test]
    async fn test_activate_renders_details() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.set_detail_response(json!({
            "description": "A desert planet.",
            "first_publish_date": "1965"
        }));
        let presenter = DetailPresenter::new(catalog.clone());

        let body = presenter.activate(&dune()).await;
        let ModalBody::Details(view) = body else {
            panic!("expected details, got {:?}", body);
        };
        assert_eq!(view.title, "Dune");
        assert_eq!(view.authors, "Frank Herbert");
        assert_eq!(view.year, "1965");
        assert_eq!(view.description, "A desert planet.");

        let modal = presenter.snapshot().await.unwrap();
        assert!(modal.visible);
        assert_eq!(modal.work_key, "/works/OL893415W");
        assert_eq!(catalog.detail_calls(), 1);
    }

    #[tokio::test]
    async fn test_modal_is_reused() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.set_detail_response(json!({}));
        let presenter = DetailPresenter::new(catalog.clone());

        presenter.activate(&dune()).await;
        assert!(presenter.dismiss(ModalEvent::CloseClicked).await);
        presenter.activate(&dune()).await;

        let modal = presenter.snapshot().await.unwrap();
        assert!(modal.visible);
        assert_eq!(modal.activation, 2);
        // Details are re-fetched on every activation.
        assert_eq!(catalog.detail_calls(), 2);
    }

    #[tokio::test]
    async fn test_error_body_keeps_modal_open() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.set_detail_error(CatalogError::Api("Request failed with status code 500".into()));
        let presenter = DetailPresenter::new(catalog);

        let body = presenter.activate(&dune()).await;
        assert_eq!(
            body,
            ModalBody::Error {
                title: "Error loading details".to_string(),
                message: "Request failed with status code 500".to_string(),
            }
        );
        assert!(presenter.snapshot().await.unwrap().visible);
    }

    #[tokio::test]
    async fn test_dismiss_events() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.set_detail_response(json!({}));
        let presenter = DetailPresenter::new(catalog);

        for event in [
            ModalEvent::CloseClicked,
            ModalEvent::OutsideClicked,
            ModalEvent::EscapePressed,
        ] {
            presenter.activate(&dune()).await;
            assert!(presenter.dismiss(event).await);
            assert!(!presenter.snapshot().await.unwrap().visible);
        }

        // Escape on a hidden modal does nothing.
        assert!(!presenter.dismiss(ModalEvent::EscapePressed).await);
        assert_eq!(ModalEvent::from_key(Key::Escape), Some(ModalEvent::EscapePressed));
        assert_eq!(ModalEvent::from_key(Key::Enter), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_while_fetch_in_flight() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.set_detail_response_after(
            json!({ "description": { "value": "Late." } }),
            Duration::from_millis(500),
        );
        let presenter = Arc::new(DetailPresenter::new(catalog));

        let task = {
            let presenter = Arc::clone(&presenter);
            tokio::spawn(async move { presenter.activate(&dune()).await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        let modal = presenter.snapshot().await.unwrap();
        assert!(modal.visible);
        assert_eq!(modal.body, ModalBody::Loading);

        assert!(presenter.dismiss(ModalEvent::OutsideClicked).await);
        assert!(!presenter.snapshot().await.unwrap().visible);

        task.await.unwrap();
        let modal = presenter.snapshot().await.unwrap();
        assert!(!modal.visible);
        assert!(matches!(modal.body, ModalBody::Details(ref v) if v.description == "Late."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_activation_is_dropped() {
        let catalog = Arc::new(MockCatalog::new());
        catalog.set_detail_response_after(
            json!({ "description": "First." }),
            Duration::from_millis(500),
        );
        let presenter = Arc::new(DetailPresenter::new(catalog.clone()));

        let first = {
            let presenter = Arc::clone(&presenter);
            tokio::spawn(async move { presenter.activate(&dune()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        catalog.set_detail_response(json!({ "description": "Second." }));
        let other = WorkSummary::new("/works/OL2W", "Children of Dune");
        presenter.activate(&other).await;

        let late = first.await.unwrap();
        assert!(matches!(late, ModalBody::Details(ref v) if v.description == "First."));

        let modal = presenter.snapshot().await.unwrap();
        assert_eq!(modal.work_key, "/works/OL2W");
        assert!(matches!(modal.body, ModalBody::Details(ref v) if v.description == "Second."));
    }
}
