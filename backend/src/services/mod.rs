//! Business logic services for the Production Costing Platform

pub mod costing;
pub mod sic;
pub mod standard_cost;
pub mod stock;

pub use costing::CostingService;
pub use sic::SicService;
pub use standard_cost::StandardCostService;
pub use stock::StockService;
