//! Work models representing catalog entries and their details.

use serde::{Deserialize, Serialize};

/// Cover identifier of a work
///
/// A numeric cover id is preferred over an edition key when both exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverId {
    /// Numeric image id (`/b/id/{id}-M.jpg`)
    Id(u64),
    /// Edition key (`/b/olid/{key}-M.jpg`)
    EditionKey(String),
}

impl CoverId {
    /// Pick the preferred identifier from the two optional catalog fields
    ///
    /// Zero ids and blank keys count as absent.
    pub fn select(cover_id: Option<i64>, edition_key: Option<&str>) -> Option<Self> {
        if let Some(id) = cover_id.filter(|id| *id > 0) {
            return Some(CoverId::Id(id as u64));
        }

        edition_key
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| CoverId::EditionKey(key.to_string()))
    }

    /// URL of the medium-size cover under `covers_base`
    pub fn medium_url(&self, covers_base: &str) -> String {
        let base = covers_base.trim_end_matches('/');
        match self {
            CoverId::Id(id) => format!("{}/b/id/{}-M.jpg", base, id),
            CoverId::EditionKey(key) => format!("{}/b/olid/{}-M.jpg", base, key),
        }
    }
}

/// A reference to an author as listed on a work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    /// Author key (e.g. `/authors/OL23919A`)
    pub key: Option<String>,

    /// Display name, when the catalog provides one
    pub name: Option<String>,
}

impl AuthorRef {
    /// Create an author reference with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            key: None,
            name: Some(name.into()),
        }
    }
}

/// One catalog entry from a subject search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkSummary {
    /// Catalog key (e.g. `/works/OL45804W`)
    pub key: String,

    /// Work title
    pub title: String,

    /// Preferred cover identifier
    pub cover: Option<CoverId>,

    /// Authors in catalog order
    pub authors: Vec<AuthorRef>,

    /// Year of first publication
    pub first_publish_year: Option<i32>,
}

impl WorkSummary {
    /// Create a work with required fields
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            cover: None,
            authors: Vec::new(),
            first_publish_year: None,
        }
    }

    /// Set the cover identifier
    pub fn cover(mut self, cover: CoverId) -> Self {
        self.cover = Some(cover);
        self
    }

    /// Append an author
    pub fn author(mut self, author: AuthorRef) -> Self {
        self.authors.push(author);
        self
    }

    /// Set the first publication year
    pub fn first_publish_year(mut self, year: i32) -> Self {
        self.first_publish_year = Some(year);
        self
    }

    /// Name of the first author, if present and non-blank
    pub fn first_author_name(&self) -> Option<&str> {
        self.authors
            .first()
            .and_then(|a| a.name.as_deref())
            .filter(|name| !name.trim().is_empty())
    }
}

/// Ordered works from one search, capped at a maximum
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    works: Vec<WorkSummary>,

    /// Total matches reported by the catalog, if known
    pub total: Option<usize>,
}

impl ResultSet {
    /// Keep at most `max` works, preserving order
    pub fn capped(mut works: Vec<WorkSummary>, max: usize) -> Self {
        works.truncate(max);
        Self { works, total: None }
    }

    pub fn total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn works(&self) -> &[WorkSummary] {
        &self.works
    }

    pub fn len(&self) -> usize {
        self.works.len()
    }

    pub fn is_empty(&self) -> bool {
        self.works.is_empty()
    }

    pub fn into_works(self) -> Vec<WorkSummary> {
        self.works
    }
}

/// Extended detail of a single work
///
/// The catalog shape varies between works (`description` may be a string or
/// an object with a `value`), so the body is kept as JSON and read through
/// pointer lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkDetail {
    /// Catalog key the detail was fetched for
    pub key: String,

    raw: serde_json::Value,
}

impl WorkDetail {
    pub fn new(key: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            raw,
        }
    }

    /// The untouched response body
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    /// Look up a JSON pointer and return it as display text
    ///
    /// Strings are returned when non-blank, numbers are formatted. Anything
    /// else counts as absent.
    pub fn text_at(&self, pointer: &str) -> Option<String> {
        json_text(self.raw.pointer(pointer)?)
    }
}

pub(crate) fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cover_id_prefers_numeric() {
        assert_eq!(
            CoverId::select(Some(8231856), Some("OL7353617M")),
            Some(CoverId::Id(8231856))
        );
        assert_eq!(
            CoverId::select(None, Some("OL7353617M")),
            Some(CoverId::EditionKey("OL7353617M".to_string()))
        );
        assert_eq!(
            CoverId::select(Some(0), Some("OL7353617M")),
            Some(CoverId::EditionKey("OL7353617M".to_string()))
        );
        assert_eq!(CoverId::select(None, Some("  ")), None);
        assert_eq!(CoverId::select(None, None), None);
    }

    #[test]
    fn test_cover_urls() {
        let base = "https://covers.openlibrary.org/";
        assert_eq!(
            CoverId::Id(42).medium_url(base),
            "https://covers.openlibrary.org/b/id/42-M.jpg"
        );
        assert_eq!(
            CoverId::EditionKey("OL1M".into()).medium_url(base),
            "https://covers.openlibrary.org/b/olid/OL1M-M.jpg"
        );
    }

    #[test]
    fn test_first_author_name() {
        let work = WorkSummary::new("/works/OL1W", "Dune")
            .author(AuthorRef {
                key: Some("/authors/OL1A".into()),
                name: None,
            })
            .author(AuthorRef::named("Frank Herbert"));
        assert_eq!(work.first_author_name(), None);

        let work = WorkSummary::new("/works/OL1W", "Dune").author(AuthorRef::named("Frank Herbert"));
        assert_eq!(work.first_author_name(), Some("Frank Herbert"));
    }

    #[test]
    fn test_result_set_capped() {
        let works: Vec<_> = (0..5)
            .map(|i| WorkSummary::new(format!("/works/OL{}W", i), format!("Book {}", i)))
            .collect();

        let set = ResultSet::capped(works, 3);
        assert_eq!(set.len(), 3);
        assert_eq!(set.works()[2].title, "Book 2");
    }

    #[test]
    fn test_detail_text_at() {
        let detail = WorkDetail::new(
            "/works/OL1W",
            json!({
                "description": { "type": "/type/text", "value": "Spice." },
                "first_publish_date": "1965",
                "revision": 12,
                "subtitle": ""
            }),
        );

        assert_eq!(detail.text_at("/description/value"), Some("Spice.".to_string()));
        assert_eq!(detail.text_at("/description"), None);
        assert_eq!(detail.text_at("/revision"), Some("12".to_string()));
        assert_eq!(detail.text_at("/subtitle"), None);
        assert_eq!(detail.text_at("/missing"), None);
    }
}
