pub mod akhq;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod provider;

pub use config::Config;
pub use error::{Ns4KafkaError, Result};
