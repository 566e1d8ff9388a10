//! Google Cloud Storage backend using the JSON API

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::Deserialize;

use super::errors::{StorageError, StorageResult};
use super::ObjectStore;
use crate::utils::GCS_API_BASE_URL;

/// Listing response fields we ask the API for
const LIST_FIELDS: &str = "items(name),nextPageToken";

/// Bucket handle backed by `reqwest`
///
/// Listing follows `nextPageToken` lazily, one page per poll of the stream.
#[derive(Debug, Clone)]
pub struct GcsObjectStore {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    access_token: Option<String>,
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectPage {
    #[serde(default)]
    items: Vec<ObjectItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectItem {
    name: String,
}

impl GcsObjectStore {
    /// Create a store for `bucket` against the public GCS endpoint
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: GCS_API_BASE_URL.to_string(),
            bucket: bucket.into(),
            access_token: None,
            page_size: None,
        }
    }

    /// Point the client at another endpoint (emulators, tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// OAuth2 bearer token sent with every request
    #[must_use]
    pub fn with_access_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Maximum names per listing page (server default when unset)
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    fn objects_url(&self) -> String {
        format!(
            "{}/storage/v1/b/{}/o",
            self.base_url,
            urlencoding::encode(&self.bucket)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn list_page(&self, page_token: Option<String>) -> StorageResult<ObjectPage> {
        let url = self.objects_url();
        let mut request = self.client.get(&url).query(&[("fields", LIST_FIELDS)]);
        if let Some(token) = &page_token {
            request = request.query(&[("pageToken", token.as_str())]);
        }
        if let Some(size) = self.page_size {
            request = request.query(&[("maxResults", size.to_string())]);
        }

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|source| StorageError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let page = response
            .json::<ObjectPage>()
            .await
            .map_err(|source| StorageError::Http { url, source })?;

        tracing::debug!(
            bucket = %self.bucket,
            names = page.items.len(),
            has_more = page.next_page_token.is_some(),
            "Fetched listing page"
        );
        Ok(page)
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    fn list(&self) -> BoxStream<'static, StorageResult<String>> {
        let store = self.clone();

        // State: Some(token) while pages remain, the first page has no token
        let pages = stream::try_unfold(Some(None::<String>), move |state| {
            let store = store.clone();
            async move {
                let Some(page_token) = state else {
                    return Ok::<_, StorageError>(None);
                };
                let page = store.list_page(page_token).await?;
                let next_state = page.next_page_token.map(Some);
                Ok::<_, StorageError>(Some((page.items, next_state)))
            }
        });

        pages
            .map_ok(|items| stream::iter(items.into_iter().map(|item| Ok::<_, StorageError>(item.name))))
            .try_flatten()
            .boxed()
    }

    async fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        let url = format!("{}/{}", self.objects_url(), urlencoding::encode(name));
        let request = self.client.get(&url).query(&[("alt", "media")]);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|source| StorageError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            return Err(StorageError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| StorageError::Http { url, source })?;
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        format!("gs://{}", self.bucket)
    }
}
