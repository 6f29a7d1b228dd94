pub struct Config {
    pub lookback_days: u32,
    pub request_timeout_secs: u64,
    pub request_interval_ms: u64,
    pub snapshot_path: Option<String>,
    pub offline: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            lookback_days: 60,
            request_timeout_secs: 30,
            request_interval_ms: 500,
            snapshot_path: None,
            offline: false,
        }
    }

    /// Calendar days of history requested from the provider
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_request_interval_ms(mut self, ms: u64) -> Self {
        self.request_interval_ms = ms;
        self
    }

    pub fn with_snapshot_path(mut self, path: Option<&str>) -> Self {
        self.snapshot_path = path.map(|p| p.to_string());
        self
    }

    // 仅使用本地快照
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Presentation settings for the chart window
#[derive(Debug, Clone)]
pub struct ChartConfig {
    pub width: f32,
    pub height: f32,
    pub dark_mode: bool,
    pub message_font_size: f32,
}

impl ChartConfig {
    pub fn new() -> Self {
        Self {
            width: 1400.0,
            height: 1000.0,
            dark_mode: false,
            message_font_size: 15.0,
        }
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_dark_mode(mut self, dark_mode: bool) -> Self {
        self.dark_mode = dark_mode;
        self
    }

    pub fn with_message_font_size(mut self, size: f32) -> Self {
        self.message_font_size = size;
        self
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = Config::new()
            .with_lookback_days(90)
            .with_snapshot_path(Some("fixtures/snapshot.json"))
            .with_offline(true);
        assert_eq!(config.lookback_days, 90);
        assert_eq!(config.request_interval_ms, 500);
        assert_eq!(config.snapshot_path.as_deref(), Some("fixtures/snapshot.json"));
        assert!(config.offline);
    }

    #[test]
    fn test_request_pacing_overrides() {
        let config = Config::new()
            .with_request_timeout_secs(5)
            .with_request_interval_ms(1200);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.request_interval_ms, 1200);
        assert_eq!(config.lookback_days, 60);
    }

    #[test]
    fn test_chart_config_overrides() {
        let chart = ChartConfig::new()
            .with_size(800.0, 600.0)
            .with_message_font_size(18.0)
            .with_dark_mode(true);
        assert_eq!(chart.width, 800.0);
        assert_eq!(chart.height, 600.0);
        assert_eq!(chart.message_font_size, 18.0);
        assert!(chart.dark_mode);

        let default = ChartConfig::default();
        assert_eq!(default.width, 1400.0);
        assert_eq!(default.message_font_size, 15.0);
        assert!(!default.dark_mode);
    }
}
