use std::time::Duration;

use mountainwatch_core::{
    CandidateList, Condition, ConditionPayload, DetailDocument, RegionDocument, RegionInfo,
    SourceSettings, normalize,
};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::pacing::Pacer;

/// Backoff between attempts; its length is the number of retries.
pub const DEFAULT_RETRY_DELAYS: [Duration; 3] =
    [Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)];

/// Client for the Outdooractive project API.
pub struct OutdoorClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_base: String,
    pub(crate) project: String,
    pub(crate) api_key: String,
    pub(crate) lang: String,
    pub(crate) pacer: Pacer,
    pub(crate) retry_delays: Vec<Duration>,
}

impl std::fmt::Debug for OutdoorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutdoorClient")
            .field("client", &self.client)
            .field("api_base", &self.api_base)
            .field("project", &self.project)
            .field("api_key", &"***")
            .field("lang", &self.lang)
            .field("pacer", &self.pacer)
            .finish_non_exhaustive()
    }
}

impl OutdoorClient {
    /// Creates a client for the configured project.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(settings: &SourceSettings, pacer: Pacer) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::ClientInit(e.to_string()))?;
        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_owned(),
            project: settings.project.clone(),
            api_key: settings.api_key.clone(),
            lang: settings.lang.clone(),
            pacer,
            retry_delays: DEFAULT_RETRY_DELAYS.to_vec(),
        })
    }

    /// Overrides the backoff schedule.
    #[must_use]
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// Ids of all conditions visible to the project.
    ///
    /// # Errors
    /// Returns an error if the listing cannot be fetched or parsed.
    pub async fn list_condition_ids(&self) -> Result<Vec<String>, FetchError> {
        let list: CandidateList = self.get_json("conditions", false, "condition list").await?;
        Ok(list.into_ids())
    }

    /// Raw detail payload of one condition.
    ///
    /// # Errors
    /// Returns an error if the request fails or the document holds no condition.
    pub async fn condition_payload(&self, id: &str) -> Result<ConditionPayload, FetchError> {
        self.pacer.wait().await;
        let context = format!("condition {id}");
        let doc: DetailDocument = self.get_json(&format!("oois/{id}"), true, &context).await?;
        doc.into_payload().map_err(|source| FetchError::Normalize { context, source })
    }

    /// Type and name of one region.
    ///
    /// # Errors
    /// Returns an error if the request fails or the document holds no region.
    pub async fn region(&self, id: &str) -> Result<RegionInfo, FetchError> {
        self.pacer.wait().await;
        let context = format!("region {id}");
        let doc: RegionDocument = self.get_json(&format!("oois/{id}"), true, &context).await?;
        doc.into_region().map_err(|source| FetchError::Normalize { context, source })
    }

    /// Detail record of `id` with its regions resolved, normalized.
    ///
    /// # Errors
    /// Returns an error if any request fails or the payload lacks id/status.
    pub async fn condition(&self, id: &str) -> Result<Condition, FetchError> {
        let payload = self.condition_payload(id).await?;

        let mut regions = Vec::new();
        for region_id in payload.region_ids() {
            regions.push(self.region(&region_id).await?);
        }

        normalize(payload, &regions)
            .map_err(|source| FetchError::Normalize { context: format!("condition {id}"), source })
    }

    /// Detail record of `id` without region lookups.
    ///
    /// # Errors
    /// Returns an error if the request fails or the payload lacks id/status.
    pub async fn condition_detail(&self, id: &str) -> Result<Condition, FetchError> {
        let payload = self.condition_payload(id).await?;
        normalize(payload, &[])
            .map_err(|source| FetchError::Normalize { context: format!("condition {id}"), source })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        localized: bool,
        context: &str,
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}/{}", self.api_base, self.project, path);
        tracing::debug!(%url, "GET");
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..=self.retry_delays.len() {
            if attempt > 0 {
                let delay = self.retry_delays.get(attempt - 1).copied().unwrap_or_default();
                tracing::warn!(
                    "Fetch retry attempt {attempt}/{} for {context} after {delay:?}",
                    self.retry_delays.len()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self
                .client
                .get(&url)
                .header(ACCEPT, "application/json")
                .query(&[("key", self.api_key.as_str())]);
            if localized {
                request = request.query(&[("lang", self.lang.as_str())]);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(FetchError::HttpRequest(e));
                    continue;
                },
            };

            let status = response.status();
            if status.is_success() {
                let body = match response.text().await {
                    Ok(b) => b,
                    Err(e) => {
                        last_error = Some(FetchError::HttpRequest(e));
                        continue;
                    },
                };
                return serde_json::from_str(&body).map_err(|e| FetchError::JsonParse {
                    context: format!("{context} (body: {})", truncate(&body, 200)),
                    source: e,
                });
            }

            let body =
                response.text().await.unwrap_or_else(|_| "Could not read error body".to_owned());
            let err =
                FetchError::HttpStatus { code: status.as_u16(), body: truncate(&body, 500).to_owned() };
            if err.is_transient() {
                last_error = Some(err);
                continue;
            }
            return Err(err);
        }

        Err(last_error.map_or_else(
            || FetchError::ClientInit("no request attempted".to_owned()),
            |e| FetchError::RetriesExhausted(Box::new(e)),
        ))
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
