//! Domain models for the Production Costing Platform

mod allocation;
mod costing;
mod material;
mod product;
mod sic;
mod stock;

pub use allocation::*;
pub use costing::*;
pub use material::*;
pub use product::*;
pub use sic::*;
pub use stock::*;
