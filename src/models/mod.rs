//! Core data models for catalog works and search queries.

mod search;
mod work;

pub use search::SearchQuery;
pub use work::{AuthorRef, CoverId, ResultSet, WorkDetail, WorkSummary};
