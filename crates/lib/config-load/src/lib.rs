//! Configuration loading orchestration for inbox-forwarder.

use std::path::PathBuf;

use config_core::Config;

mod locate;
mod paths;

pub use locate::*;
pub use paths::*;

/// Env variable that points at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "INBOX_FORWARDER_CONFIG";

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Env variable reading error.
    #[error("config path env var read: {0}")]
    Env(#[source] envfury::Error<envfury::ValueError<<PathBuf as std::str::FromStr>::Err>>),

    /// No file could be read.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// The file was found but is not a valid config.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,

        /// Underlying YAML error.
        #[source]
        source: config_yaml::YamlError,
    },
}

/// Load configuration from the path in [`CONFIG_ENV_VAR`], or from the default locations.
pub async fn with_default_env_var() -> Result<Located<Config>, Error> {
    let env_path = envfury::maybe(CONFIG_ENV_VAR).map_err(Error::Env)?;
    with(env_path).await
}

/// Load configuration from an explicit path if given, or from the default locations.
pub async fn with(env_path: Option<PathBuf>) -> Result<Located<Config>, Error> {
    let paths: Vec<PathBuf> = resolve(env_path).collect();
    let Located { path, payload } = read_first(&paths).await?;

    tracing::debug!(config_path = %path.display(), "parsing config file");

    match config_yaml::parse_str(&payload) {
        Ok(payload) => Ok(Located { payload, path }),
        Err(source) => Err(Error::Parse { path, source }),
    }
}
