//! Domain core for the Mealbridge food-donation coordination platform.

pub mod config;
pub mod donations;
pub mod error;
pub mod geo;
pub mod identity;
pub mod ngos;
pub mod scoring;
pub mod store;
pub mod telemetry;
pub mod volunteers;
