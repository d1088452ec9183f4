//! Pre-flight cost estimation for AI search calls.
//!
//! Token counts are a length-based approximation (four characters per token),
//! not a tokenizer. Every figure produced here is finite: invalid prices fall
//! back to [`FALLBACK_PRICE_PER_MILLION`] and invalid rates to [`DEFAULT_USD_BRL`].

use serde::{Deserialize, Serialize};

pub const FALLBACK_PRICE_PER_MILLION: f64 = 1.0;
pub const DEFAULT_USD_BRL: f64 = 5.2;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 900;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// USD prices per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self {
            input_per_million: FALLBACK_PRICE_PER_MILLION,
            output_per_million: FALLBACK_PRICE_PER_MILLION,
        }
    }
}

impl ModelPricing {
    pub fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            input_per_million: sanitize_price(self.input_per_million),
            output_per_million: sanitize_price(self.output_per_million),
        }
    }
}

fn sanitize_price(price: f64) -> f64 {
    if price.is_finite() && price >= 0.0 {
        price
    } else {
        FALLBACK_PRICE_PER_MILLION
    }
}

/// Known model prices; unknown model ids get the fallback pricing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceTable {
    models: Vec<(String, ModelPricing)>,
}

impl PriceTable {
    pub fn new(models: Vec<(String, ModelPricing)>) -> Self {
        Self { models }
    }

    pub fn pricing_for(&self, model: &str) -> ModelPricing {
        self.models
            .iter()
            .find(|(id, _)| id == model)
            .map(|(_, pricing)| *pricing)
            .unwrap_or_default()
    }

    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|(id, _)| id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PricingQuote {
    pub tokens_in: u64,
    pub cost_usd: f64,
    pub cost_brl: f64,
}

/// Authoritative figures reported by the service after a completed search.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RemoteCost {
    pub tokens_in: Option<u64>,
    pub cost_usd: Option<f64>,
    pub cost_brl: Option<f64>,
}

impl RemoteCost {
    pub fn is_empty(&self) -> bool {
        self.tokens_in.is_none() && self.cost_usd.is_none() && self.cost_brl.is_none()
    }
}

impl PricingQuote {
    /// The figures to display once the service has reported its own.
    ///
    /// Each finite remote figure replaces the local one; the rest stay as estimated.
    pub fn superseded_by(&self, remote: &RemoteCost) -> PricingQuote {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        PricingQuote {
            tokens_in: remote.tokens_in.unwrap_or(self.tokens_in),
            cost_usd: finite(remote.cost_usd).unwrap_or(self.cost_usd),
            cost_brl: finite(remote.cost_brl).unwrap_or(self.cost_brl),
        }
    }
}

/// USD to BRL exchange rate that only changes to valid values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExchangeRate(f64);

impl Default for ExchangeRate {
    fn default() -> Self {
        Self(DEFAULT_USD_BRL)
    }
}

impl ExchangeRate {
    pub fn new(rate: f64) -> Self {
        Self::default().updated(Some(rate))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns the fetched rate when it is usable, otherwise keeps the current one.
    pub fn updated(self, fetched: Option<f64>) -> Self {
        match fetched {
            Some(rate) if rate.is_finite() && rate > 0.0 => Self(rate),
            _ => self,
        }
    }
}

pub fn approx_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    (chars / 4).max(1)
}

pub fn estimate(
    prompt: &str,
    link_extra_tokens: u64,
    pricing: ModelPricing,
    max_output_tokens: u32,
    usd_brl: f64,
) -> PricingQuote {
    let pricing = pricing.normalized();
    let rate = ExchangeRate::default().updated(Some(usd_brl)).value();

    let tokens_in = approx_tokens(prompt).saturating_add(link_extra_tokens);
    let cost_usd = (tokens_in as f64 / TOKENS_PER_MILLION) * pricing.input_per_million
        + (f64::from(max_output_tokens) / TOKENS_PER_MILLION) * pricing.output_per_million;
    PricingQuote {
        tokens_in,
        cost_usd,
        cost_brl: cost_usd * rate,
    }
}
