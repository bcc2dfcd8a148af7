//! Cover image loading over HTTP.

use async_trait::async_trait;
use serde::Serialize;

use crate::sources::{CoverError, CoverLoader};
use crate::utils::HttpClient;

/// A cover that finished loading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverImage {
    /// URL the image was loaded from
    pub url: String,

    /// Size of the image body in bytes
    pub bytes: usize,

    pub content_type: Option<String>,
}

/// Loads covers with a GET request and checks that an image came back
#[derive(Debug, Clone)]
pub struct HttpCoverLoader {
    client: HttpClient,
}

impl HttpCoverLoader {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CoverLoader for HttpCoverLoader {
    async fn load(&self, url: &str) -> Result<CoverImage, CoverError> {
        let response = self.client.client().get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoverError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        // A non-image body counts as a failed load, like a broken <img>.
        if let Some(ct) = content_type.as_deref() {
            if !ct.starts_with("image/") {
                return Err(CoverError::NotAnImage(ct.to_string()));
            }
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(CoverError::NotAnImage("empty body".to_string()));
        }

        Ok(CoverImage {
            url: url.to_string(),
            bytes: body.len(),
            content_type,
        })
    }
}
