use crate::models::stock::PriceSample;
use crate::errors::Result;
use async_trait::async_trait;

/// Base trait for market data sources
#[async_trait]
pub trait MarketDataScraper {
    /// Name used in logs
    fn source_name(&self) -> &'static str;

    /// Fetch daily closing prices for a symbol, oldest first
    async fn fetch_price_history(&self, symbol: &str) -> Result<Vec<PriceSample>>;

    /// Fetch the current shares outstanding, `None` if the source does not know it
    async fn fetch_shares_outstanding(&self, symbol: &str) -> Result<Option<u64>>;
}
