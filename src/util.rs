use chrono::NaiveDate;
use log::info;
use crate::models::stock::PriceSample;
use crate::errors::{Result, DelistError};

// 日期转换工具
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")?)
}

pub fn date_to_str(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Trim, uppercase and reject empty tickers
pub fn normalize_ticker(raw: &str) -> Result<String> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(DelistError::InvalidTicker(raw.to_string()));
    }
    Ok(ticker)
}

// 只保留最近的记录（序列按日期升序）
pub fn limit_price_samples(samples: &mut Vec<PriceSample>, max_records: usize, symbol: &str) {
    if samples.len() > max_records {
        info!("Limiting {} daily closes to the most recent {} for {}",
              samples.len(), max_records, symbol);
        samples.drain(..samples.len() - max_records);
    }
}

/// Integer with `,` thousands separators
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Dollar amount rounded to whole dollars, with separators
pub fn format_dollars(value: f64) -> String {
    format!("${}", format_thousands(value.max(0.0).round() as u64))
}
