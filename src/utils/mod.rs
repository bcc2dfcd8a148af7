//! Shared utilities.
//!
//! - [`HttpClient`]: pooled HTTP client with the catalog request timeout,
//!   shared by the catalog source and the cover loader

mod http;

pub use http::HttpClient;
