pub mod api;
pub mod client;
pub mod config;
pub mod cron;
pub mod database;
pub mod error;
pub mod export;
pub mod fetch;
pub mod model;
pub mod service;
pub mod views;

pub use client::PriceMonitorClient;
pub use config::Settings;
pub use database::Database;
pub use error::{Error, Result};
pub use fetch::{HttpProductSource, ProductSource};
pub use service::PriceMonitor;
