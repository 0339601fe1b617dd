//! Binance REST price feed
//!
//! Index price from the USD-M futures `premiumIndex` endpoint and quote-asset
//! price from the spot `ticker/price` endpoint. Binance encodes prices as
//! decimal strings; a missing or non-positive value is reported as `None`.

use super::ReferencePriceSource;
use crate::error::{MonitorError, MonitorResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_FUTURES_URL: &str = "https://fapi.binance.com";
pub const DEFAULT_SPOT_URL: &str = "https://api.binance.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumIndex {
    #[allow(dead_code)]
    symbol: String,
    index_price: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    #[allow(dead_code)]
    symbol: String,
    price: Option<String>,
}

/// Parse a Binance decimal string into a usable price
fn parse_price(raw: Option<&str>) -> Option<f64> {
    raw?.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
}

pub struct BinanceClient {
    client: reqwest::Client,
    futures_url: String,
    spot_url: String,
    /// Futures symbol for the index price, e.g. TAKEUSDT
    index_symbol: String,
    /// Spot symbol for the quote asset, e.g. BNBUSDT
    quote_symbol: String,
}

impl BinanceClient {
    pub fn new(
        futures_url: impl Into<String>,
        spot_url: impl Into<String>,
        index_symbol: impl Into<String>,
        quote_symbol: impl Into<String>,
        timeout: Duration,
    ) -> MonitorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::fetch("binance", e))?;

        Ok(Self {
            client,
            futures_url: futures_url.into().trim_end_matches('/').to_string(),
            spot_url: spot_url.into().trim_end_matches('/').to_string(),
            index_symbol: index_symbol.into(),
            quote_symbol: quote_symbol.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, source_name: &'static str, url: &str) -> MonitorResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MonitorError::fetch(source_name, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::fetch(source_name, format!("HTTP {}", status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MonitorError::fetch(source_name, e))
    }
}

#[async_trait]
impl ReferencePriceSource for BinanceClient {
    async fn index_price_usd(&self) -> MonitorResult<Option<f64>> {
        let url = format!(
            "{}/fapi/v1/premiumIndex?symbol={}",
            self.futures_url, self.index_symbol
        );
        let body: PremiumIndex = self.get_json("binance-futures", &url).await?;
        let price = parse_price(body.index_price.as_deref());
        debug!("Binance index {}: {:?}", self.index_symbol, price);
        Ok(price)
    }

    async fn quote_price_usd(&self) -> MonitorResult<Option<f64>> {
        let url = format!(
            "{}/api/v3/ticker/price?symbol={}",
            self.spot_url, self.quote_symbol
        );
        let body: TickerPrice = self.get_json("binance-spot", &url).await?;
        let price = parse_price(body.price.as_deref());
        debug!("Binance spot {}: {:?}", self.quote_symbol, price);
        Ok(price)
    }
}
