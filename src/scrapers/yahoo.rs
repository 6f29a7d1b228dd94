use crate::config::Config;
use crate::models::stock::PriceSample;
use crate::errors::{Result, DelistError};
use crate::scrapers::base::MarketDataScraper;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use log::{debug, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const REFERER: &str = "https://finance.yahoo.com/";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URLS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";

/// Yahoo Finance 数据抓取器
pub struct YahooScraper {
    client: Client,
    lookback_days: u32,
    request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
    crumb: tokio::sync::Mutex<Option<String>>,
}

impl YahooScraper {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(DelistError::RequestError)?;

        Ok(Self {
            client,
            lookback_days: config.lookback_days,
            request_interval: Duration::from_millis(config.request_interval_ms),
            last_request: Mutex::new(None),
            crumb: tokio::sync::Mutex::new(None),
        })
    }

    /// 等待请求频率限制
    async fn wait_for_rate_limit(&self) {
        let now = Instant::now();
        let should_wait = {
            let mut last = match self.last_request.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let should_wait = last
                .map(|instant| instant.elapsed())
                .filter(|elapsed| *elapsed < self.request_interval)
                .map(|elapsed| self.request_interval - elapsed);
            *last = Some(now);
            should_wait
        };

        if let Some(wait_time) = should_wait {
            debug!("Waiting {:?} between Yahoo requests", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    /// Cached crumb, fetching a new cookie and crumb when none is held
    async fn crumb(&self) -> Result<String> {
        let mut crumb = self.crumb.lock().await;
        if let Some(value) = crumb.as_ref() {
            return Ok(value.clone());
        }

        // fc.yahoo.com answers 404 but still sets the session cookie
        self.wait_for_rate_limit().await;
        if let Err(e) = self.client.get(COOKIE_URL).header("Referer", REFERER).send().await {
            debug!("Cookie request failed: {}", e);
        }

        for url in CRUMB_URLS {
            self.wait_for_rate_limit().await;
            let response = match self.client.get(url).header("Referer", REFERER).send().await {
                Ok(response) => response,
                Err(e) => {
                    debug!("Crumb request to {} failed: {}", url, e);
                    continue;
                }
            };
            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                return Err(DelistError::ProviderError(
                    "Yahoo rate limited while fetching crumb".to_string(),
                ));
            }
            if !response.status().is_success() {
                continue;
            }

            let body = response.text().await?;
            let body = body.trim();
            if is_valid_crumb(body) {
                debug!("Obtained Yahoo crumb");
                *crumb = Some(body.to_string());
                return Ok(body.to_string());
            }
        }

        Err(DelistError::ProviderError(
            "failed to fetch Yahoo crumb from all endpoints".to_string(),
        ))
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    /// GET a Yahoo JSON endpoint, refreshing the crumb once on 401/429.
    /// 404 bodies are returned since Yahoo reports unknown symbols there.
    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        for attempt in 0..2 {
            let crumb = self.crumb().await?;
            self.wait_for_rate_limit().await;

            let response = self.client
                .get(url)
                .query(query)
                .query(&[("crumb", crumb.as_str())])
                .header("Referer", REFERER)
                .send()
                .await
                .map_err(DelistError::RequestError)?;

            let status = response.status();
            if (status == StatusCode::UNAUTHORIZED || status == StatusCode::TOO_MANY_REQUESTS)
                && attempt == 0
            {
                warn!("Yahoo returned {} for {}, refreshing crumb", status, url);
                self.invalidate_crumb().await;
                continue;
            }

            if !status.is_success() && status != StatusCode::NOT_FOUND {
                return Err(DelistError::ProviderError(format!(
                    "Yahoo returned status {} for {}",
                    status, url
                )));
            }

            return Ok(response.text().await?);
        }

        Err(DelistError::ProviderError(format!(
            "Yahoo rejected {} after crumb refresh",
            url
        )))
    }
}

#[async_trait]
impl MarketDataScraper for YahooScraper {
    fn source_name(&self) -> &'static str {
        "Yahoo"
    }

    async fn fetch_price_history(&self, symbol: &str) -> Result<Vec<PriceSample>> {
        let period2 = Utc::now().timestamp();
        let period1 = period2 - i64::from(self.lookback_days) * 86_400;
        info!("Fetching {} days of price history for {}", self.lookback_days, symbol);

        let url = format!("{}/{}", CHART_URL, urlencoding::encode(symbol));
        let body = self
            .get_json(
                &url,
                &[
                    ("period1", period1.to_string()),
                    ("period2", period2.to_string()),
                    ("interval", "1d".to_string()),
                    ("events", "history".to_string()),
                ],
            )
            .await?;

        let samples = parse_chart_response(&body)?;
        debug!("Got {} daily closes for {}", samples.len(), symbol);
        Ok(samples)
    }

    async fn fetch_shares_outstanding(&self, symbol: &str) -> Result<Option<u64>> {
        let url = format!("{}/{}", QUOTE_SUMMARY_URL, urlencoding::encode(symbol));
        let body = self
            .get_json(&url, &[("modules", "defaultKeyStatistics".to_string())])
            .await?;

        let shares = parse_shares_response(&body)?;
        debug!("Shares outstanding for {}: {:?}", symbol, shares);
        Ok(shares)
    }
}

fn is_valid_crumb(body: &str) -> bool {
    !body.is_empty()
        && body.len() < 100
        && !body.contains(' ')
        && !body.contains('<')
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Parse a v8 chart body into daily closes, oldest first.
///
/// Timestamps are shifted by the exchange GMT offset before taking the date.
/// Null or non-positive closes are skipped and a repeated date keeps the later
/// bar. An API error object yields an empty series.
pub fn parse_chart_response(body: &str) -> Result<Vec<PriceSample>> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        warn!("Yahoo chart error {}: {}", error.code, error.description);
        return Ok(Vec::new());
    }

    let result = match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };

    let closes = match result.indicators.quote.into_iter().next() {
        Some(quote) => quote.close,
        None => return Ok(Vec::new()),
    };

    let mut by_date = BTreeMap::new();
    for (ts, close) in result.timestamp.iter().zip(closes) {
        let close = match close {
            Some(c) if c.is_finite() && c > 0.0 => c,
            _ => continue,
        };
        let date = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)
            .ok_or_else(|| DelistError::DataError(format!("Invalid timestamp: {}", ts)))?
            .date_naive();
        by_date.insert(date, close);
    }

    Ok(by_date
        .into_iter()
        .map(|(date, close)| PriceSample::new(date, close))
        .collect())
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    #[serde(rename = "defaultKeyStatistics", default)]
    default_key_statistics: Option<KeyStatistics>,
}

#[derive(Debug, Deserialize)]
struct KeyStatistics {
    #[serde(rename = "sharesOutstanding", default)]
    shares_outstanding: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

/// Parse `defaultKeyStatistics.sharesOutstanding.raw` from a quote summary body
pub fn parse_shares_response(body: &str) -> Result<Option<u64>> {
    let response: QuoteSummaryResponse = serde_json::from_str(body)?;

    if let Some(error) = response.quote_summary.error {
        warn!("Yahoo quote summary error {}: {}", error.code, error.description);
        return Ok(None);
    }

    let raw = response
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .and_then(|r| r.default_key_statistics)
        .and_then(|s| s.shares_outstanding)
        .and_then(|v| v.raw);

    Ok(raw.filter(|v| v.is_finite() && *v >= 1.0).map(|v| v.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_chart_response() {
        // 2024-03-04/05/06 14:30 UTC market opens, New York offset -5h
        let body = r#"{
            "chart": {
                "result": [{
                    "meta": {"currency": "USD", "symbol": "AMC", "gmtoffset": -18000},
                    "timestamp": [1709562600, 1709649000, 1709735400],
                    "indicators": {
                        "quote": [{"close": [4.25, null, 4.5], "open": [4.0, 4.1, 4.2]}],
                        "adjclose": [{"adjclose": [4.25, null, 4.5]}]
                    }
                }],
                "error": null
            }
        }"#;

        let samples = parse_chart_response(body).unwrap();
        assert_eq!(
            samples,
            vec![
                PriceSample::new(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), 4.25),
                PriceSample::new(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(), 4.5),
            ]
        );
    }

    #[test]
    fn test_parse_chart_keeps_last_bar_per_date() {
        let body = r#"{"chart": {"result": [{
            "meta": {"gmtoffset": 0},
            "timestamp": [1709769600, 1709812800],
            "indicators": {"quote": [{"close": [1.0, 1.2]}]}
        }], "error": null}}"#;

        let samples = parse_chart_response(body).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].close, 1.2);
    }

    #[test]
    fn test_parse_chart_error_is_empty() {
        let body = r#"{"chart": {"result": null, "error": {
            "code": "Not Found",
            "description": "No data found, symbol may be delisted"
        }}}"#;
        assert!(parse_chart_response(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_chart_rejects_garbage() {
        assert!(matches!(
            parse_chart_response("<html>Too Many Requests</html>"),
            Err(DelistError::JsonError(_))
        ));
    }

    #[test]
    fn test_parse_shares_response() {
        let body = r#"{"quoteSummary": {"result": [{"defaultKeyStatistics": {
            "sharesOutstanding": {"raw": 263542000, "fmt": "263.54M", "longFmt": "263,542,000"}
        }}], "error": null}}"#;
        assert_eq!(parse_shares_response(body).unwrap(), Some(263_542_000));
    }

    #[test]
    fn test_parse_shares_missing() {
        let body = r#"{"quoteSummary": {"result": [{"defaultKeyStatistics": {
            "sharesOutstanding": {}
        }}], "error": null}}"#;
        assert_eq!(parse_shares_response(body).unwrap(), None);

        let body = r#"{"quoteSummary": {"result": null, "error": {
            "code": "Not Found", "description": "Quote not found for symbol: ZZZZ"
        }}}"#;
        assert_eq!(parse_shares_response(body).unwrap(), None);
    }

    #[test]
    fn test_is_valid_crumb() {
        assert!(is_valid_crumb("aBcD3fGh.iJ"));
        assert!(!is_valid_crumb(""));
        assert!(!is_valid_crumb("Too Many Requests"));
        assert!(!is_valid_crumb("<!DOCTYPE html>"));
    }
}
