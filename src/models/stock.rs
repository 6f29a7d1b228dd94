use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 单个交易日的收盘价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceSample {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Input for one analysis run, built fresh per request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisInput {
    pub ticker: String,
    /// Oldest first
    pub price_series: Vec<PriceSample>,
    pub shares_outstanding: Option<u64>,
}

impl AnalysisInput {
    pub fn new(ticker: &str, price_series: Vec<PriceSample>, shares_outstanding: Option<u64>) -> Self {
        Self {
            ticker: ticker.to_string(),
            price_series,
            shares_outstanding,
        }
    }
}

/// 派生的日线指标
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedDay {
    pub date: NaiveDate,
    pub close: f64,
    pub market_cap: f64,
    pub below_price_threshold: bool,
    pub below_cap_threshold: bool,
}
