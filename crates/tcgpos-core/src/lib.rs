mod app_config;
mod config;
pub mod sales;
pub mod status;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use sales::{
    load_sales, ProductHistory, Sale, SaleProduct, SaleRule, SaleStatus, SalesFile,
    SoldCountOverflow,
};
pub use status::{apply_transition, floor_to_ten_minutes, plan_status_updates, StatusTransition};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sales file {path}: {source}")]
    SalesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sales file: {0}")]
    SalesFileParse(#[from] serde_yaml::Error),

    #[error("sales validation failed: {0}")]
    Validation(String),
}
