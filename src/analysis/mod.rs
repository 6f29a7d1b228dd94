use chrono::{Days, NaiveDate};
use log::debug;

use crate::errors::{DelistError, Result, UnavailableReason};
use crate::models::risk::{RiskAssessment, RiskLevel};
use crate::models::stock::{AnalysisInput, DerivedDay, PriceSample};

/// 最低收盘价 ($)
pub const PRICE_THRESHOLD: f64 = 1.0;
/// 最低市值 ($)
pub const MARKET_CAP_THRESHOLD: f64 = 35_000_000.0;
/// Trailing window in trading days
pub const WINDOW_DAYS: usize = 30;
pub const WARNING_DAYS: usize = 21;
pub const CAUTION_DAYS: usize = 14;

/// Compute market cap and threshold flags for each sample
pub fn derive_days(samples: &[PriceSample], shares_outstanding: u64) -> Vec<DerivedDay> {
    samples
        .iter()
        .map(|s| {
            let market_cap = s.close * shares_outstanding as f64;
            DerivedDay {
                date: s.date,
                close: s.close,
                market_cap,
                below_price_threshold: s.close < PRICE_THRESHOLD,
                below_cap_threshold: market_cap < MARKET_CAP_THRESHOLD,
            }
        })
        .collect()
}

/// Classify by violation counts. First matching rule wins.
pub fn classify(low_price_days: usize, low_cap_days: usize) -> RiskLevel {
    if low_price_days >= WINDOW_DAYS && low_cap_days >= WINDOW_DAYS {
        RiskLevel::CriticalBoth
    } else if low_price_days >= WINDOW_DAYS {
        RiskLevel::CriticalPrice
    } else if low_cap_days >= WINDOW_DAYS {
        RiskLevel::CriticalCap
    } else if low_price_days >= WARNING_DAYS || low_cap_days >= WARNING_DAYS {
        RiskLevel::Warning
    } else if low_price_days >= CAUTION_DAYS || low_cap_days >= CAUTION_DAYS {
        RiskLevel::Caution
    } else {
        RiskLevel::Safe
    }
}

/// Analyze the most recent `WINDOW_DAYS` samples of `input`.
///
/// `today` is only used to project the delisting date.
pub fn analyze(input: &AnalysisInput, today: NaiveDate) -> Result<RiskAssessment> {
    let available = input.price_series.len();
    if available < WINDOW_DAYS {
        return Err(DelistError::data_unavailable(
            &input.ticker,
            UnavailableReason::InsufficientHistory { available },
        ));
    }

    let shares_outstanding = match input.shares_outstanding {
        Some(shares) if shares > 0 => shares,
        _ => {
            return Err(DelistError::data_unavailable(
                &input.ticker,
                UnavailableReason::SharesOutstandingUnknown,
            ))
        }
    };

    let window = &input.price_series[available - WINDOW_DAYS..];
    let days = derive_days(window, shares_outstanding);

    let low_price_days = days.iter().filter(|d| d.below_price_threshold).count();
    let low_cap_days = days.iter().filter(|d| d.below_cap_threshold).count();
    let remaining_price_days = WINDOW_DAYS.saturating_sub(low_price_days);
    let remaining_cap_days = WINDOW_DAYS.saturating_sub(low_cap_days);

    let risk_level = classify(low_price_days, low_cap_days);

    // Price remainder wins whenever the price count reaches the caution bar,
    // even if the level came from the cap count.
    let estimated_delisting_date = if risk_level.has_projection() {
        let remaining = if low_price_days >= CAUTION_DAYS {
            remaining_price_days
        } else {
            remaining_cap_days
        };
        today.checked_add_days(Days::new(remaining as u64))
    } else {
        None
    };

    debug!(
        "{}: {} days below ${}, {} days below ${} market cap -> {:?}",
        input.ticker, low_price_days, PRICE_THRESHOLD, low_cap_days, MARKET_CAP_THRESHOLD, risk_level
    );

    Ok(RiskAssessment {
        ticker: input.ticker.clone(),
        shares_outstanding,
        days,
        low_price_days,
        low_cap_days,
        remaining_price_days,
        remaining_cap_days,
        risk_level,
        statement: risk_level.statement().to_string(),
        estimated_delisting_date,
    })
}
