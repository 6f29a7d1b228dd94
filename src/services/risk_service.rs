use crate::analysis::{self, WINDOW_DAYS};
use crate::errors::{Result, DelistError};
use crate::models::risk::RiskAssessment;
use crate::models::stock::AnalysisInput;
use crate::scrapers::base::MarketDataScraper;
use crate::util;
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;

/// 风险服务，负责获取数据并调用分析
pub struct RiskService {
    scrapers: Vec<Arc<dyn MarketDataScraper + Send + Sync>>,
}

impl RiskService {
    pub fn new(scrapers: Vec<Arc<dyn MarketDataScraper + Send + Sync>>) -> Self {
        Self { scrapers }
    }

    /// Build the analysis input from the first source with a full window of prices.
    ///
    /// A source error (history or shares) falls through to the next source.
    /// A source with fewer than `WINDOW_DAYS` closes also falls through, but is
    /// kept as a fallback so the analyzer can report the short history. The
    /// last error is returned only if no source produced any prices.
    pub async fn load_input(&self, ticker: &str) -> Result<AnalysisInput> {
        let ticker = util::normalize_ticker(ticker)?;
        let mut last_error: Option<DelistError> = None;
        let mut short_input: Option<AnalysisInput> = None;

        for scraper in &self.scrapers {
            info!("Querying {} for {}", scraper.source_name(), ticker);

            let mut samples = match scraper.fetch_price_history(&ticker).await {
                Ok(samples) => samples,
                Err(e) => {
                    warn!("{} failed to fetch history for {}: {}", scraper.source_name(), ticker, e);
                    last_error = Some(e);
                    continue;
                }
            };

            if samples.is_empty() {
                info!("{} has no price history for {}", scraper.source_name(), ticker);
                continue;
            }

            let shares = match scraper.fetch_shares_outstanding(&ticker).await {
                Ok(shares) => shares,
                Err(e) => {
                    warn!("{} failed to fetch shares outstanding for {}: {}", scraper.source_name(), ticker, e);
                    last_error = Some(e);
                    continue;
                }
            };

            if samples.len() < WINDOW_DAYS {
                info!("{} has only {} daily closes for {}", scraper.source_name(), samples.len(), ticker);
                if short_input.is_none() {
                    short_input = Some(AnalysisInput::new(&ticker, samples, shares));
                }
                continue;
            }

            util::limit_price_samples(&mut samples, WINDOW_DAYS, &ticker);
            return Ok(AnalysisInput::new(&ticker, samples, shares));
        }

        match (short_input, last_error) {
            (Some(input), _) => Ok(input),
            (None, Some(e)) => Err(e),
            (None, None) => Ok(AnalysisInput::new(&ticker, Vec::new(), None)),
        }
    }

    /// Fetch and analyze one ticker, projecting dates from `today`
    pub async fn assess(&self, ticker: &str, today: NaiveDate) -> Result<RiskAssessment> {
        let input = self.load_input(ticker).await?;
        let assessment = analysis::analyze(&input, today)?;
        info!("{}: {}", assessment.ticker, assessment.risk_level);
        Ok(assessment)
    }
}
