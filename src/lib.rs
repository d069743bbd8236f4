// Library exports for the UI layer and tests
pub mod config;
pub mod error;
pub mod gateway;
pub mod marketplace;
pub mod models;
pub mod services;
pub mod telemetry;

pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use marketplace::Marketplace;
