//! # Owly
//!
//! Search the Open Library catalog by subject, build result cards whose
//! covers are loaded concurrently, and show extended details for a single
//! work.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (WorkSummary, ResultSet, SearchQuery, etc.)
//! - [`sources`]: Catalog and cover loading behind async traits
//! - [`search`]: The search orchestrator, its state machine and the card builder
//! - [`detail`]: The detail presenter and its singleton modal
//! - [`ui`]: Terminal rendering of cards, indicator and modal
//! - [`utils`]: HTTP client
//! - [`config`]: Configuration management

pub mod config;
pub mod detail;
pub mod models;
pub mod search;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{ResultSet, SearchQuery, WorkDetail, WorkSummary};
pub use search::{SearchOrchestrator, SearchOutcome};
pub use sources::{CatalogSource, CoverLoader};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
