use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::models::stock::PriceSample;
use crate::errors::Result;
use crate::scrapers::base::MarketDataScraper;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// 快照中的单只股票
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub symbol: String,
    #[serde(default)]
    pub shares_outstanding: Option<u64>,
    #[serde(default)]
    pub daily: Vec<PriceSample>,
}

/// Market data served from a local JSON snapshot
pub struct SnapshotProvider {
    data: Vec<SnapshotEntry>,
    symbol_index: HashMap<String, usize>,
}

impl SnapshotProvider {
    /// 使用提供的数据创建新的数据提供者实例
    pub fn new_with_data(data: Vec<SnapshotEntry>) -> Self {
        let mut provider = Self {
            data,
            symbol_index: HashMap::new(),
        };

        provider.rebuild_indices();

        provider
    }

    /// 从文件加载数据
    pub fn load_from_file(path: &str) -> Result<Self> {
        let text = fs::read_to_string(Path::new(path))?;
        let provider = Self::from_json(&text)?;
        info!("Loaded {} symbols from snapshot {}", provider.data.len(), path);
        Ok(provider)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let data: Vec<SnapshotEntry> = serde_json::from_str(text)?;
        Ok(Self::new_with_data(data))
    }

    /// Case-insensitive symbol lookup
    pub fn get_entry_by_symbol(&self, symbol: &str) -> Option<&SnapshotEntry> {
        self.symbol_index
            .get(&symbol.to_uppercase())
            .map(|&idx| &self.data[idx])
    }

    /// 重建索引，同时按日期升序排列日线
    fn rebuild_indices(&mut self) {
        self.symbol_index.clear();

        for (i, entry) in self.data.iter_mut().enumerate() {
            entry.daily.sort_by(|a, b| a.date.cmp(&b.date));
            self.symbol_index.insert(entry.symbol.to_uppercase(), i);
        }
    }
}

#[async_trait]
impl MarketDataScraper for SnapshotProvider {
    fn source_name(&self) -> &'static str {
        "Snapshot"
    }

    async fn fetch_price_history(&self, symbol: &str) -> Result<Vec<PriceSample>> {
        let daily = self
            .get_entry_by_symbol(symbol)
            .map(|e| e.daily.clone())
            .unwrap_or_default();
        debug!("Snapshot has {} daily closes for {}", daily.len(), symbol);
        Ok(daily)
    }

    async fn fetch_shares_outstanding(&self, symbol: &str) -> Result<Option<u64>> {
        Ok(self
            .get_entry_by_symbol(symbol)
            .and_then(|e| e.shares_outstanding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SNAPSHOT: &str = r#"[
        {
            "symbol": "mull",
            "shares_outstanding": 12000000,
            "daily": [
                {"date": "2024-02-02", "close": 0.41},
                {"date": "2024-02-01", "close": 0.44}
            ]
        },
        {"symbol": "NOSH", "daily": []}
    ]"#;

    #[test]
    fn test_from_json_indexes_and_sorts() {
        let provider = SnapshotProvider::from_json(SNAPSHOT).unwrap();
        assert_eq!(provider.data.len(), 2);

        let entry = provider.get_entry_by_symbol("MULL").unwrap();
        assert_eq!(entry.shares_outstanding, Some(12_000_000));
        assert_eq!(entry.daily[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(entry.daily[1].close, 0.41);

        assert!(provider.get_entry_by_symbol("nosh").is_some());
        assert!(provider.get_entry_by_symbol("AAPL").is_none());
    }

    #[tokio::test]
    async fn test_scraper_impl() {
        let provider = SnapshotProvider::from_json(SNAPSHOT).unwrap();

        assert_eq!(provider.fetch_price_history("Mull").await.unwrap().len(), 2);
        assert_eq!(provider.fetch_shares_outstanding("NOSH").await.unwrap(), None);
        assert!(provider.fetch_price_history("AAPL").await.unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(SnapshotProvider::load_from_file("/nonexistent/snapshot.json").is_err());
    }
}
