use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use url::Url;
use watcher_logging::watch_info;

use crate::backend::map_reqwest_error;
use crate::types::{BackendError, FailureKind};
use crate::wire::value_to_f64;

pub const DEFAULT_RATE_URL: &str = "https://economia.awesomeapi.com.br/json/last/USD-BRL";

#[derive(Debug, Deserialize)]
struct RateResponse {
    #[serde(rename = "USDBRL")]
    usd_brl: Option<RateQuote>,
}

#[derive(Debug, Deserialize)]
struct RateQuote {
    bid: Option<Value>,
}

/// Reads the current USD to BRL bid from a public quote service.
#[derive(Debug, Clone)]
pub struct RateFetcher {
    url: Url,
    client: reqwest::Client,
}

impl RateFetcher {
    pub fn new(url: &str, connect_timeout: Duration) -> Result<Self, BackendError> {
        let url = Url::parse(url.trim())
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(connect_timeout * 3)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { url, client })
    }

    /// Returns a finite, positive rate or an error; callers keep their previous rate on error.
    pub async fn fetch_usd_brl(&self) -> Result<f64, BackendError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed: RateResponse = serde_json::from_slice(&bytes)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))?;
        let rate = parsed
            .usd_brl
            .and_then(|quote| quote.bid)
            .as_ref()
            .and_then(value_to_f64)
            .filter(|rate| *rate > 0.0)
            .ok_or_else(|| BackendError::new(FailureKind::Decode, "quote has no usable bid"))?;
        watch_info!("USD/BRL rate fetched: {:.4}", rate);
        Ok(rate)
    }
}
