use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod sites;
pub mod types;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use sites::{credentials_from_env, load_sites, SiteCredentials, SiteEntry, SitesFile};
pub use types::{
    size_set_for_gender, FieldSelection, LocalizedContent, ProductAttributes, SiteKey, SiteMap,
    SyncStatus, Variation, ADULT_SIZES, CHILD_SIZES, DEFAULT_GENDER,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sites file {path}: {source}")]
    SitesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sites file: {0}")]
    SitesFileParse(#[from] serde_yaml::Error),

    #[error("invalid sites configuration: {0}")]
    Validation(String),
}
