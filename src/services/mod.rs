pub mod risk_service;
