//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the terminal user.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration problem (file or arguments).
    #[error("configuration error: {0}")]
    Config(String),

    /// The config file failed to load.
    #[error(transparent)]
    ConfigFile(#[from] waypost::config::ConfigError),

    /// The catalog failed to load; nothing can be shown.
    #[error("could not load places: {0}")]
    Catalog(#[from] waypost::catalog::CatalogError),

    /// HTTP client setup failed.
    #[error("routing setup failed: {0}")]
    Provider(#[from] waypost::provider::ProviderError),

    /// A replay file could not be read or parsed.
    #[error("invalid replay file: {0}")]
    Replay(String),

    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
