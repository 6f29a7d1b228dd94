// 公开导出的模块，供外部使用
pub mod models;
pub mod analysis;
pub mod errors;
pub mod config;
pub mod scrapers;
pub mod data_provider;
pub mod services;
pub mod report;
pub mod gui;
pub mod util;

// 重新导出常用类型，方便使用
pub use models::stock::{AnalysisInput, DerivedDay, PriceSample};
pub use models::risk::{RiskAssessment, RiskLevel, Severity};
pub use analysis::analyze;
pub use errors::{Result, DelistError};
