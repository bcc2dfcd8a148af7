//! Result card builder.
//!
//! A card becomes renderable once its cover has loaded, fallen back to the
//! placeholder, or the bounded wait has elapsed. Building a card never fails:
//! a missing cover degrades the card, it never drops it.

use serde::Serialize;
use tokio::time::{timeout_at, Instant};

use crate::config::CoverConfig;
use crate::models::WorkSummary;
use crate::sources::CoverLoader;

/// Author line shown when a work lists no named author
pub const UNKNOWN_AUTHOR: &str = "Unknown author";

/// Where a card's cover ended up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CoverState {
    /// The selected cover loaded
    Loaded { url: String, bytes: usize },
    /// The cover failed and the fallback placeholder loaded instead
    Fallback { url: String },
    /// Both the cover and the fallback failed
    Broken { url: String },
    /// The bounded wait elapsed while `url` was still loading
    Pending { url: String },
}

impl CoverState {
    /// URL currently shown (or being loaded) for this card
    pub fn url(&self) -> &str {
        match self {
            CoverState::Loaded { url, .. }
            | CoverState::Fallback { url }
            | CoverState::Broken { url }
            | CoverState::Pending { url } => url,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, CoverState::Loaded { .. })
    }
}

/// Keys the terminal front end forwards to cards and the modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Space,
    Escape,
    Char(char),
}

/// A user gesture on a card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Click,
    KeyPress(Key),
}

impl Activation {
    /// Whether this gesture opens the detail view
    ///
    /// Pointer clicks always do; of the keys only Enter and Space do.
    pub fn opens_detail(self) -> bool {
        matches!(
            self,
            Activation::Click | Activation::KeyPress(Key::Enter) | Activation::KeyPress(Key::Space)
        )
    }
}

/// A renderable unit bound to one work
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedCard {
    /// Position in the catalog response
    pub position: usize,
    pub title: String,
    pub author: String,
    /// Alternative text for the cover
    pub alt: String,
    pub cover: CoverState,
    pub work: WorkSummary,
}

impl RenderedCard {
    /// The work whose detail should open for `activation`, if any
    pub fn activate(&self, activation: Activation) -> Option<&WorkSummary> {
        activation.opens_detail().then_some(&self.work)
    }
}

/// Cover URL for a work: numeric id, then edition key, then placeholder
pub fn cover_url(work: &WorkSummary, covers: &CoverConfig) -> String {
    match &work.cover {
        Some(cover) => cover.medium_url(&covers.base_url),
        None => covers.placeholder_url.clone(),
    }
}

/// Build the card for `work`, waiting at most `covers.timeout()` for its cover
pub async fn build_card(
    work: WorkSummary,
    position: usize,
    loader: &dyn CoverLoader,
    covers: &CoverConfig,
) -> RenderedCard {
    let deadline = Instant::now() + covers.timeout();
    let primary = cover_url(&work, covers);

    // The fallback shares the deadline with the primary cover.
    let cover = match timeout_at(deadline, loader.load(&primary)).await {
        Ok(Ok(image)) => CoverState::Loaded {
            url: image.url,
            bytes: image.bytes,
        },
        Ok(Err(err)) => {
            tracing::debug!(url = %primary, error = %err, "Cover failed, using fallback");
            let fallback = covers.fallback_url.clone();
            match timeout_at(deadline, loader.load(&fallback)).await {
                Ok(Ok(_)) => CoverState::Fallback { url: fallback },
                Ok(Err(_)) => CoverState::Broken { url: fallback },
                Err(_) => CoverState::Pending { url: fallback },
            }
        }
        Err(_) => {
            tracing::debug!(url = %primary, "Cover wait elapsed");
            CoverState::Pending { url: primary }
        }
    };

    let author = work.first_author_name().unwrap_or(UNKNOWN_AUTHOR).to_string();
    let alt = if work.title.trim().is_empty() {
        "Book".to_string()
    } else {
        work.title.clone()
    };

    RenderedCard {
        position,
        title: work.title.clone(),
        author,
        alt,
        cover,
        work,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorRef, CoverId};
    use crate::sources::{CoverBehavior, MockCoverLoader};
    use std::time::Duration;

    fn covers() -> CoverConfig {
        CoverConfig {
            base_url: "https://covers.test".to_string(),
            placeholder_url: "https://img.test/sm.png".to_string(),
            fallback_url: "https://img.test/lg.png".to_string(),
            timeout_ms: 2_000,
        }
    }

    #[test]
    fn test_cover_url_priority() {
        let covers = covers();
        let work = WorkSummary::new("/works/OL1W", "A").cover(CoverId::Id(7));
        assert_eq!(cover_url(&work, &covers), "https://covers.test/b/id/7-M.jpg");

        let work = WorkSummary::new("/works/OL1W", "A").cover(CoverId::EditionKey("OL2M".into()));
        assert_eq!(cover_url(&work, &covers), "https://covers.test/b/olid/OL2M-M.jpg");

        let work = WorkSummary::new("/works/OL1W", "A");
        assert_eq!(cover_url(&work, &covers), "https://img.test/sm.png");
    }

    #[test]
    fn test_activation_keys() {
        assert!(Activation::Click.opens_detail());
        assert!(Activation::KeyPress(Key::Enter).opens_detail());
        assert!(Activation::KeyPress(Key::Space).opens_detail());
        assert!(!Activation::KeyPress(Key::Escape).opens_detail());
        assert!(!Activation::KeyPress(Key::Char('x')).opens_detail());
    }

    #[tokio::test]
    async fn test_card_content() {
        let loader = MockCoverLoader::default();
        let work = WorkSummary::new("/works/OL1W", "Dune")
            .cover(CoverId::Id(7))
            .author(AuthorRef::named("Frank Herbert"));

        let card = build_card(work, 3, &loader, &covers()).await;
        assert_eq!(card.position, 3);
        assert_eq!(card.title, "Dune");
        assert_eq!(card.author, "Frank Herbert");
        assert_eq!(card.alt, "Dune");
        assert!(card.cover.is_loaded());
        assert_eq!(card.cover.url(), "https://covers.test/b/id/7-M.jpg");
        assert!(card.activate(Activation::Click).is_some());
    }

    #[tokio::test]
    async fn test_missing_author_and_title() {
        let loader = MockCoverLoader::default();
        let card = build_card(WorkSummary::new("/works/OL1W", ""), 0, &loader, &covers()).await;
        assert_eq!(card.author, UNKNOWN_AUTHOR);
        assert_eq!(card.alt, "Book");
        assert_eq!(card.cover.url(), "https://img.test/sm.png");
    }

    #[tokio::test]
    async fn test_failed_cover_uses_fallback() {
        let loader = MockCoverLoader::new(CoverBehavior::Load);
        loader.set("https://covers.test/b/id/7-M.jpg", CoverBehavior::Fail);
        let work = WorkSummary::new("/works/OL1W", "A").cover(CoverId::Id(7));

        let card = build_card(work, 0, &loader, &covers()).await;
        assert_eq!(
            card.cover,
            CoverState::Fallback {
                url: "https://img.test/lg.png".to_string()
            }
        );
        assert_eq!(
            loader.requested(),
            vec!["https://covers.test/b/id/7-M.jpg", "https://img.test/lg.png"]
        );
    }

    #[tokio::test]
    async fn test_broken_fallback_still_resolves() {
        let loader = MockCoverLoader::new(CoverBehavior::Fail);
        let card = build_card(WorkSummary::new("/works/OL1W", "A"), 0, &loader, &covers()).await;
        assert_eq!(
            card.cover,
            CoverState::Broken {
                url: "https://img.test/lg.png".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_cover_resolves_within_bounded_wait() {
        let loader = MockCoverLoader::new(CoverBehavior::Hang);
        let started = Instant::now();

        let card = build_card(WorkSummary::new("/works/OL1W", "A"), 0, &loader, &covers()).await;

        assert_eq!(
            card.cover,
            CoverState::Pending {
                url: "https://img.test/sm.png".to_string()
            }
        );
        assert!(started.elapsed() <= Duration::from_millis(2_000) + Duration::from_millis(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fallback_shares_deadline() {
        let loader = MockCoverLoader::new(CoverBehavior::Load);
        loader.set("https://img.test/sm.png", CoverBehavior::Fail);
        loader.set(
            "https://img.test/lg.png",
            CoverBehavior::Delay(Duration::from_secs(10)),
        );
        let started = Instant::now();

        let card = build_card(WorkSummary::new("/works/OL1W", "A"), 0, &loader, &covers()).await;

        assert!(matches!(card.cover, CoverState::Pending { .. }));
        assert_eq!(card.cover.url(), "https://img.test/lg.png");
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
