//! Yahoo Finance chart API client
//!
//! Daily OHLCV bars via the public v8 chart endpoint. Yahoo rejects requests
//! without a browser User-Agent, and signals symbol-level failures inside a
//! 200 response (`chart.error`), so both are handled here.

use crate::error::{AppError, Result};
use crate::market::{MarketData, ProviderBar};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Bound on a single provider call; a hang upstream must not hang a request
/// or a scheduler tick indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<i64>>,
}

/// Market data client backed by Yahoo Finance
pub struct YahooClient {
    client: reqwest::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    /// Build a client against an alternate endpoint (used by tests).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    fn parse_bars(symbol: &str, response: ChartResponse) -> Result<Vec<ProviderBar>> {
        if let Some(error) = response.chart.error {
            return Err(AppError::Upstream(format!(
                "provider error for {}: {} - {}",
                symbol, error.code, error.description
            )));
        }

        let result = response
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or_else(|| {
                AppError::Upstream(format!("provider returned no result for {}", symbol))
            })?;

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::Upstream(format!("provider returned no quote block for {}", symbol))
            })?;

        let mut bars = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            // Yahoo pads series with nulls for halted sessions; skip those rows
            let (open, high, low, close) = match (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
            ) {
                (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
                _ => continue,
            };
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0);

            let timestamp = DateTime::<Utc>::from_timestamp(*ts, 0).ok_or_else(|| {
                AppError::Upstream(format!("invalid timestamp {} for {}", ts, symbol))
            })?;

            bars.push(ProviderBar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

#[async_trait]
impl MarketData for YahooClient {
    async fn fetch_history(&self, symbol: &str, days: u32) -> Result<Vec<ProviderBar>> {
        let url = format!(
            "{}/{}?interval=1d&range={}d",
            self.base_url, symbol, days
        );
        debug!("Fetching history for {} from {}", symbol, url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "provider HTTP {} for {}: {}",
                status, symbol, body
            )));
        }

        let parsed: ChartResponse = response.json().await?;
        Self::parse_bars(symbol, parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_json(body: &str) -> ChartResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn parses_bars_and_skips_null_rows() {
        let response = chart_json(
            r#"{"chart":{"result":[{"timestamp":[1700000000,1700086400,1700172800],
                "indicators":{"quote":[{
                    "open":[10.0,null,12.0],
                    "high":[11.0,null,13.0],
                    "low":[9.0,null,11.5],
                    "close":[10.5,null,12.5],
                    "volume":[1000,null,2000]}]}}],
                "error":null}}"#,
        );

        let bars = YahooClient::parse_bars("PETR4.SA", response).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 10.5);
        assert_eq!(bars[1].volume, 2000);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn provider_error_maps_to_upstream() {
        let response = chart_json(
            r#"{"chart":{"result":null,
                "error":{"code":"Not Found","description":"No data found"}}}"#,
        );

        let err = YahooClient::parse_bars("NOPE.SA", response).unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn missing_result_maps_to_upstream() {
        let response = chart_json(r#"{"chart":{"result":[],"error":null}}"#);
        let err = YahooClient::parse_bars("PETR4.SA", response).unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
