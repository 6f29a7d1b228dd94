use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::models::stock::DerivedDay;

/// Ordinal severity shared by the display layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Safe,
    Caution,
    Warning,
    Critical,
}

/// Risk classification, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    CriticalBoth,
    CriticalPrice,
    CriticalCap,
    Warning,
    Caution,
    Safe,
}

impl RiskLevel {
    pub fn statement(&self) -> &'static str {
        match self {
            RiskLevel::CriticalBoth => "High risk of delisting.",
            RiskLevel::CriticalPrice => "Price criterion alone poses delisting risk.",
            RiskLevel::CriticalCap => "Market cap criterion alone poses delisting risk.",
            RiskLevel::Warning => "Approaching delisting threshold.",
            RiskLevel::Caution => "Maintain compliance.",
            RiskLevel::Safe => "This stock is currently safe from delisting.",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            RiskLevel::CriticalBoth | RiskLevel::CriticalPrice | RiskLevel::CriticalCap => {
                Severity::Critical
            }
            RiskLevel::Warning => Severity::Warning,
            RiskLevel::Caution => Severity::Caution,
            RiskLevel::Safe => Severity::Safe,
        }
    }

    /// Whether a delisting date is projected for this level
    pub fn has_projection(&self) -> bool {
        matches!(self, RiskLevel::Warning | RiskLevel::Caution)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::CriticalBoth => "Critical (price & market cap)",
            RiskLevel::CriticalPrice => "Critical (price)",
            RiskLevel::CriticalCap => "Critical (market cap)",
            RiskLevel::Warning => "Warning",
            RiskLevel::Caution => "Caution",
            RiskLevel::Safe => "Safe",
        };
        write!(f, "{}", label)
    }
}

/// 退市风险评估结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub ticker: String,
    pub shares_outstanding: u64,
    pub days: Vec<DerivedDay>,
    pub low_price_days: usize,
    pub low_cap_days: usize,
    pub remaining_price_days: usize,
    pub remaining_cap_days: usize,
    pub risk_level: RiskLevel,
    pub statement: String,
    pub estimated_delisting_date: Option<NaiveDate>,
}

impl RiskAssessment {
    pub fn severity(&self) -> Severity {
        self.risk_level.severity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Safe < Severity::Caution);
        assert!(Severity::Caution < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
        assert_eq!(RiskLevel::CriticalCap.severity(), RiskLevel::CriticalBoth.severity());
    }

    #[test]
    fn test_projection_levels() {
        assert!(RiskLevel::Warning.has_projection());
        assert!(RiskLevel::Caution.has_projection());
        assert!(!RiskLevel::CriticalPrice.has_projection());
        assert!(!RiskLevel::Safe.has_projection());
    }
}
