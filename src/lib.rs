pub mod api;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod models;
pub mod monitoring;
pub mod report;
pub mod telemetry;

mod endpoint;
mod response;
mod wire;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{MetricsServiceError, Result};
