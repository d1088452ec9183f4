use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use watcher_core::{
    CollectCounts, DiagnosticsPatterns, DiagnosticsReport, Record, SearchRequest, SearchResult,
    ServiceConfig,
};
use watcher_logging::{watch_debug, watch_info};

use crate::cancel::{race_abort, AbortSignal};
use crate::types::{Abortable, BackendError, FailureKind};
use crate::wire::{
    log_service_errors, value_to_u64, CollectBody, CollectResponse, ConfigResponse,
    CountTokensBody, CountTokensResponse, DiagnosticsBody, DiagnosticsResponse, ItemsResponse,
    SearchBody, SearchResponse,
};

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Whole-request limit. `None` leaves long collections unbounded.
    pub request_timeout: Option<Duration>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

/// Remote operations of the collection service.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_config(&self) -> Result<ServiceConfig, BackendError>;

    /// Collects one group. Long-running; never interrupted once sent.
    async fn collect(&self, group: &str, min_days: u32) -> Result<CollectCounts, BackendError>;

    /// Probes every provider. The call is dropped as soon as `signal` fires.
    async fn run_diagnostics(
        &self,
        patterns: &DiagnosticsPatterns,
        signal: &AbortSignal,
    ) -> Abortable<Result<DiagnosticsReport, BackendError>>;

    async fn load_items(
        &self,
        group: &str,
        status: Option<&str>,
    ) -> Result<Vec<Record>, BackendError>;

    async fn count_link_tokens(&self, url: &str) -> Result<u64, BackendError>;

    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, BackendError>;
}

/// [`Backend`] speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, BackendError> {
        watch_debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        decode_response(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let payload = serde_json::to_vec(body)
            .map_err(|err| BackendError::new(FailureKind::InvalidInput, err.to_string()))?;
        watch_debug!("POST {} ({} bytes)", url, payload.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_response(response).await
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn fetch_config(&self) -> Result<ServiceConfig, BackendError> {
        let response: ConfigResponse = self.get_json(self.endpoint("api/config")?).await?;
        log_service_errors("api/config", &response.errors);
        Ok(response.config.into_config())
    }

    async fn collect(&self, group: &str, min_days: u32) -> Result<CollectCounts, BackendError> {
        let body = CollectBody {
            groups: [group],
            min_days,
        };
        let response: CollectResponse = self.post_json("api/collect", &body).await?;
        log_service_errors("api/collect", &response.errors);
        let counts = response
            .result
            .ok_or_else(|| BackendError::new(FailureKind::Decode, "response has no result"))?
            .into_counts();
        watch_info!(
            "Collected {}: {} fixed link(s), {} new item(s)",
            group,
            counts.fixed_links,
            counts.new_items
        );
        Ok(counts)
    }

    async fn run_diagnostics(
        &self,
        patterns: &DiagnosticsPatterns,
        signal: &AbortSignal,
    ) -> Abortable<Result<DiagnosticsReport, BackendError>> {
        let body = DiagnosticsBody::from(patterns);
        let call = async {
            let response: DiagnosticsResponse =
                self.post_json("api/diag/providers", &body).await?;
            log_service_errors("api/diag/providers", &response.errors);
            Ok(response.diag.into_report())
        };
        race_abort(signal, call).await
    }

    async fn load_items(
        &self,
        group: &str,
        status: Option<&str>,
    ) -> Result<Vec<Record>, BackendError> {
        let mut url = self.endpoint("api/items")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("group", group);
            if let Some(status) = status.and_then(status_filter) {
                query.append_pair("status", status);
            }
        }
        let response: ItemsResponse = self.get_json(url).await?;
        log_service_errors("api/items", &response.errors);
        Ok(response.items.into_records(group))
    }

    async fn count_link_tokens(&self, url: &str) -> Result<u64, BackendError> {
        let link = url.trim();
        if link.is_empty() {
            return Err(BackendError::new(FailureKind::InvalidInput, "link is empty"));
        }
        Url::parse(link).map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let response: CountTokensResponse = self
            .post_json("api/perplexity/count_tokens", &CountTokensBody { url: link })
            .await?;
        log_service_errors("api/perplexity/count_tokens", &response.errors);
        if !response.ok {
            let message = response
                .error
                .unwrap_or_else(|| "token count failed".to_string());
            return Err(BackendError::new(FailureKind::Service, message));
        }
        Ok(response.tokens.as_ref().and_then(value_to_u64).unwrap_or(0))
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResult, BackendError> {
        if request.prompt.trim().is_empty() {
            return Err(BackendError::new(FailureKind::InvalidInput, "prompt is empty"));
        }
        let response: SearchResponse = self
            .post_json("api/perplexity/search", &SearchBody::from(request))
            .await?;
        log_service_errors("api/perplexity/search", &response.errors);
        Ok(response.result.into_result())
    }
}

/// `All`/`Todos` and blank mean "no status filter".
fn status_filter(status: &str) -> Option<&str> {
    let status = status.trim();
    let unfiltered = status.is_empty()
        || status.eq_ignore_ascii_case("all")
        || status.eq_ignore_ascii_case("todos");
    (!unfiltered).then_some(status)
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    let bytes = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&bytes)
        .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_all_statuses_do_not_filter() {
        assert_eq!(status_filter("All"), None);
        assert_eq!(status_filter(" todos "), None);
        assert_eq!(status_filter(""), None);
        assert_eq!(status_filter(" novo "), Some("novo"));
    }
}
