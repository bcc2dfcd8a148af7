//! Display fields of the detail view.
//!
//! Each field lists its sources in priority order and ends in a named
//! default.

use serde::Serialize;

use crate::models::{WorkDetail, WorkSummary};

/// Reads one candidate value for a field
pub type Accessor = fn(&WorkSummary, &WorkDetail) -> Option<String>;

/// A display field with ordered sources and a default
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub accessors: &'static [Accessor],
    pub default: &'static str,
}

impl Field {
    /// First non-blank value among the accessors, else the default
    pub fn resolve(&self, work: &WorkSummary, detail: &WorkDetail) -> String {
        let value = self
            .accessors
            .iter()
            .find_map(|read| read(work, detail))
            .filter(|value| !value.trim().is_empty());

        value.unwrap_or_else(|| {
            tracing::trace!(field = self.name, key = %work.key, "Using default");
            self.default.to_string()
        })
    }
}

fn work_title(work: &WorkSummary, _: &WorkDetail) -> Option<String> {
    non_blank(&work.title)
}

fn detail_title(_: &WorkSummary, detail: &WorkDetail) -> Option<String> {
    detail.text_at("/title")
}

fn work_authors(work: &WorkSummary, _: &WorkDetail) -> Option<String> {
    if work.authors.is_empty() {
        return None;
    }
    let names: Vec<&str> = work
        .authors
        .iter()
        .map(|a| {
            a.name
                .as_deref()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("Unknown")
        })
        .collect();
    Some(names.join(", "))
}

fn detail_first_publish_date(_: &WorkSummary, detail: &WorkDetail) -> Option<String> {
    detail.text_at("/first_publish_date")
}

fn work_first_publish_year(work: &WorkSummary, _: &WorkDetail) -> Option<String> {
    work.first_publish_year.map(|y| y.to_string())
}

fn description_value(_: &WorkSummary, detail: &WorkDetail) -> Option<String> {
    detail.text_at("/description/value")
}

fn description_text(_: &WorkSummary, detail: &WorkDetail) -> Option<String> {
    detail.text_at("/description")
}

fn non_blank(s: &str) -> Option<String> {
    (!s.trim().is_empty()).then(|| s.to_string())
}

pub const TITLE: Field = Field {
    name: "title",
    accessors: &[work_title, detail_title],
    default: "Untitled",
};

pub const AUTHORS: Field = Field {
    name: "authors",
    accessors: &[work_authors],
    default: "Unknown author",
};

pub const YEAR: Field = Field {
    name: "year",
    accessors: &[detail_first_publish_date, work_first_publish_year],
    default: "Unknown year",
};

pub const DESCRIPTION: Field = Field {
    name: "description",
    accessors: &[description_value, description_text],
    default: "Description not available",
};

/// The resolved content of the detail modal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailView {
    pub key: String,
    pub title: String,
    pub authors: String,
    pub year: String,
    pub description: String,
}

impl DetailView {
    pub fn resolve(work: &WorkSummary, detail: &WorkDetail) -> Self {
        Self {
            key: work.key.clone(),
            title: TITLE.resolve(work, detail),
            authors: AUTHORS.resolve(work, detail),
            year: YEAR.resolve(work, detail),
            description: DESCRIPTION.resolve(work, detail),
        }
    }
}
