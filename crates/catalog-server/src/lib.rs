pub mod api;
pub mod config;
pub mod metrics;
pub mod service;

pub use api::{router, AppState};
pub use config::Config;
pub use service::CatalogService;
