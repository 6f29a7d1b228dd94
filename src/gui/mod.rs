pub mod risk_chart;
