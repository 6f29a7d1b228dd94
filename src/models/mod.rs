pub mod stock;
pub mod risk;
