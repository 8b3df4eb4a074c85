use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("vault root does not exist: {0}")]
    VaultNotFound(PathBuf),

    #[error("invalid vault path: {0}")]
    InvalidVaultPath(String),

    #[error("note title {0:?} does not make a usable file name")]
    InvalidTitle(String),

    #[error("invalid date format {format:?}: {reason}")]
    Format { format: String, reason: String },

    #[error("failed to write note at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("vault registry json parse error at {path}: {source}")]
    RegistryJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no vaults registered")]
    NoVaults,

    #[error("no vault matches {0:?}")]
    VaultNotFoundByName(String),

    #[error("ambiguous vault selection: {candidates:?}")]
    AmbiguousVault { candidates: Vec<String> },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(format: &str, reason: impl Into<String>) -> Self {
        Self::Format {
            format: format.to_string(),
            reason: reason.into(),
        }
    }
}
