//! Finding the first readable config file.

use std::path::{Path, PathBuf};

/// A payload together with the file it came from.
#[derive(Debug)]
pub struct Located<T> {
    /// The actual payload.
    pub payload: T,

    /// The file the payload was read from.
    pub path: PathBuf,
}

/// Error returned while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// No configuration file found in any of the provided paths.
    #[error("no config file found in paths: {paths:?}")]
    NotFound {
        /// The paths that were tried.
        paths: Vec<PathBuf>,
    },

    /// A config file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path to the configuration file.
        path: PathBuf,

        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Read the first file in `paths` that exists.
///
/// Missing files are skipped; any other I/O error stops the search.
pub async fn read_first<P>(paths: &[P]) -> Result<Located<String>, ReadError>
where
    P: AsRef<Path>,
{
    for path in paths.iter().map(AsRef::as_ref) {
        match tokio::fs::read_to_string(path).await {
            Ok(payload) => {
                return Ok(Located {
                    payload,
                    path: path.to_path_buf(),
                });
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::trace!(config_path = %path.display(), "no config file here");
            }
            Err(source) => {
                return Err(ReadError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    Err(ReadError::NotFound {
        paths: paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
    })
}
