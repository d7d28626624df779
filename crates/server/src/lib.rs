pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;

pub use config::{ConfigError, LogFormat, OcrBackendKind, OcrConfig, ServerConfig};
pub use error::{ApiError, ErrorBody};
pub use routes::{router, AppState};
