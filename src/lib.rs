pub mod config;
pub mod encryption_engine;
pub mod error;
pub mod payment_gateway;
pub mod routes;

pub use config::{Config, MpesaConfig};
pub use error::MpesaError;
