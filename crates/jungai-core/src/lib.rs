//! Shared configuration and domain vocabulary for the JungAI archetype pipeline.

pub mod app_config;
pub mod archetype;
pub mod brands;
pub mod config;

pub use app_config::{AppConfig, Environment, SourceSettings, TruncationPolicy};
pub use archetype::{Archetype, SourceKind};
pub use brands::{load_brands, BrandConfig, BrandQuery, BrandsFile};
pub use config::{load_app_config, load_app_config_from_env};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[from] serde_yaml::Error),

    #[error("brands validation failed: {0}")]
    Validation(String),
}
