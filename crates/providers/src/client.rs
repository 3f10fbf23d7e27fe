use std::time::Duration;

use assess_report_core::constants::MAX_BATCH_IDS;
use assess_report_core::{ProviderError, ProviderResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::wire::{BatchRequest, ListResponse};

/// Backoff between attempts; one retry per entry.
pub const DEFAULT_RETRY_DELAYS: [Duration; 3] =
    [Duration::from_millis(250), Duration::from_millis(500), Duration::from_secs(1)];

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-over-HTTP client for one provider base URL.
#[derive(Clone)]
pub struct ProviderClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    retry_delays: Vec<Duration>,
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("retry_delays", &self.retry_delays)
            .finish_non_exhaustive()
    }
}

impl ProviderClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(base_url: &str, api_key: Option<String>) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Transport(format!("client init: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            retry_delays: DEFAULT_RETRY_DELAYS.to_vec(),
        })
    }

    #[must_use]
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` as JSON and return the raw response text, retrying
    /// transient failures.
    async fn send<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> ProviderResult<String> {
        let url = format!("{}{path}", self.base_url);
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..=self.retry_delays.len() {
            if attempt > 0 {
                let delay = self.retry_delays.get(attempt - 1).copied().unwrap_or_default();
                tokio::time::sleep(delay).await;
                tracing::warn!(%url, attempt, max = self.retry_delays.len(), "provider retry after {delay:?}");
            }

            let mut request = self.client.post(&url).json(body);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ProviderError::Transport(e.to_string()));
                    continue;
                },
            };

            let status = response.status();
            if status.is_success() {
                match response.text().await {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        last_error = Some(ProviderError::Transport(e.to_string()));
                        continue;
                    },
                }
            }

            let body = response.text().await.unwrap_or_else(|_| "could not read error body".to_owned());
            let err = ProviderError::Status { code: status.as_u16(), body };
            if err.is_transient() {
                last_error = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(last_error.unwrap_or_else(|| ProviderError::Transport(format!("no attempt made for {url}"))))
    }

    /// POST and decode the JSON response.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> ProviderResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let text = self.send(path, body).await?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode {
            context: format!("{path} (body: {})", truncate(&text, 200)),
            message: e.to_string(),
        })
    }

    /// POST a command whose response body carries nothing of interest.
    pub async fn post_command<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> ProviderResult<()> {
        self.send(path, body).await.map(|_| ())
    }

    /// Batch lookup by id, split into requests of at most [`MAX_BATCH_IDS`].
    /// An empty id list makes no request.
    pub async fn batch_list<T: DeserializeOwned>(&self, path: &str, ids: &[String]) -> ProviderResult<Vec<T>> {
        self.batch_list_with(path, ids, |chunk| BatchRequest { ids: chunk }).await
    }

    pub async fn batch_list_with<'a, T, B, F>(
        &self,
        path: &str,
        ids: &'a [String],
        make_body: F,
    ) -> ProviderResult<Vec<T>>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
        F: Fn(&'a [String]) -> B,
    {
        let mut items = Vec::new();
        for chunk in ids.chunks(MAX_BATCH_IDS) {
            let page: ListResponse<T> = self.post_json(path, &make_body(chunk)).await?;
            items.extend(page.data);
        }
        Ok(items)
    }
}

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}
