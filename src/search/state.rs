//! Shared render state and its pure transition function.
//!
//! The indicator and the render container are the only things a search
//! writes to. Every write goes through [`SearchState::apply`], which takes
//! the current state and an event and returns the next state. Events carry
//! the generation of the search that produced them; anything from a search
//! that is no longer the latest is dropped.

use serde::Serialize;

use super::card::RenderedCard;

/// Placeholder text of the indicator
pub const LOADING_TEXT: &str = "⏳ Loading...";

/// Loading/error indicator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadingState {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl LoadingState {
    /// Whether the indicator is shown at all
    pub fn is_visible(&self) -> bool {
        matches!(self, LoadingState::Loading | LoadingState::Error(_))
    }

    /// Text the indicator displays
    pub fn text(&self) -> String {
        match self {
            LoadingState::Error(message) => format!("⚠️ {}", message),
            _ => LOADING_TEXT.to_string(),
        }
    }
}

/// The container that holds the rendered cards
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderContainer {
    cards: Vec<RenderedCard>,
}

impl RenderContainer {
    /// Remove every card; clearing an empty container is a no-op
    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn append(&mut self, card: RenderedCard) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[RenderedCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card by 1-based display number
    pub fn get(&self, number: usize) -> Option<&RenderedCard> {
        number.checked_sub(1).and_then(|i| self.cards.get(i))
    }
}

/// Something that happened to a search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// A search began
    Started { generation: u64 },
    /// A search finished building its cards
    Rendered {
        generation: u64,
        cards: Vec<RenderedCard>,
    },
    /// A search failed with a user-facing message
    Failed { generation: u64, message: String },
    /// The error display time of a failed search ran out
    ErrorExpired { generation: u64 },
}

/// Whether an event changed the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Stale,
}

/// Indicator, container and the generation bookkeeping behind them
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    indicator: LoadingState,
    container: RenderContainer,
    latest_generation: u64,
    /// Generation whose outcome is on display
    shown_generation: Option<u64>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indicator(&self) -> &LoadingState {
        &self.indicator
    }

    pub fn container(&self) -> &RenderContainer {
        &self.container
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    pub fn shown_generation(&self) -> Option<u64> {
        self.shown_generation
    }

    /// Apply one event, returning the next state
    pub fn apply(mut self, event: SearchEvent) -> (Self, Transition) {
        let transition = match event {
            SearchEvent::Started { generation } => {
                if generation <= self.latest_generation {
                    Transition::Stale
                } else {
                    self.latest_generation = generation;
                    self.indicator = LoadingState::Loading;
                    Transition::Applied
                }
            }
            SearchEvent::Rendered { generation, cards } => {
                if generation != self.latest_generation {
                    Transition::Stale
                } else {
                    self.container.clear();
                    for card in cards {
                        self.container.append(card);
                    }
                    self.indicator = LoadingState::Success;
                    self.shown_generation = Some(generation);
                    Transition::Applied
                }
            }
            SearchEvent::Failed {
                generation,
                message,
            } => {
                if generation != self.latest_generation {
                    Transition::Stale
                } else {
                    self.container.clear();
                    self.indicator = LoadingState::Error(message);
                    self.shown_generation = Some(generation);
                    Transition::Applied
                }
            }
            SearchEvent::ErrorExpired { generation } => {
                let showing_this_error = matches!(self.indicator, LoadingState::Error(_))
                    && self.shown_generation == Some(generation);
                if showing_this_error {
                    self.indicator = LoadingState::Idle;
                    Transition::Applied
                } else {
                    Transition::Stale
                }
            }
        };

        (self, transition)
    }
}
