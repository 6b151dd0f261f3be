//! FSN-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, FsnError>;

/// Top-level error type for Folder Sentinel.
#[derive(Debug, Error)]
pub enum FsnError {
    #[error("[FSN-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[FSN-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[FSN-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[FSN-2001] state store IO failure at {path}: {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[FSN-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[FSN-3001] folder not found: {path}")]
    FolderNotFound { path: PathBuf },

    #[error("[FSN-3002] scan already in progress")]
    ScanInProgress,

    #[error("[FSN-3003] folder already monitored: {path}")]
    DuplicateFolder { path: PathBuf },

    #[error("[FSN-3004] folder is not monitored: {path}")]
    NotMonitored { path: PathBuf },

    #[error("[FSN-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl FsnError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "FSN-1001",
            Self::MissingConfig { .. } => "FSN-1002",
            Self::ConfigParse { .. } => "FSN-1003",
            Self::StoreIo { .. } => "FSN-2001",
            Self::Serialization { .. } => "FSN-2101",
            Self::FolderNotFound { .. } => "FSN-3001",
            Self::ScanInProgress => "FSN-3002",
            Self::DuplicateFolder { .. } => "FSN-3003",
            Self::NotMonitored { .. } => "FSN-3004",
            Self::Runtime { .. } => "FSN-3900",
        }
    }

    /// Whether this is a busy signal rather than a failure of the underlying
    /// operation. Busy signals are reported to the user and dropped; nothing
    /// needs recovery.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::ScanInProgress)
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreIo { .. } | Self::ScanInProgress | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for store IO errors with a known path.
    #[must_use]
    pub fn store_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::StoreIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for FsnError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for FsnError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_errors() -> Vec<FsnError> {
        vec![
            FsnError::InvalidConfig {
                details: String::new(),
            },
            FsnError::MissingConfig {
                path: PathBuf::new(),
            },
            FsnError::ConfigParse {
                context: "",
                details: String::new(),
            },
            FsnError::StoreIo {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
            FsnError::Serialization {
                context: "",
                details: String::new(),
            },
            FsnError::FolderNotFound {
                path: PathBuf::new(),
            },
            FsnError::ScanInProgress,
            FsnError::DuplicateFolder {
                path: PathBuf::new(),
            },
            FsnError::NotMonitored {
                path: PathBuf::new(),
            },
            FsnError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = all_errors();
        let codes: Vec<&str> = errors.iter().map(FsnError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_fsn_prefix() {
        for err in &all_errors() {
            assert!(
                err.code().starts_with("FSN-"),
                "code {} must start with FSN-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = FsnError::InvalidConfig {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("FSN-1001"),
            "display should contain error code: {msg}"
        );
        assert!(
            msg.contains("bad value"),
            "display should contain details: {msg}"
        );
    }

    #[test]
    fn scan_in_progress_is_busy_not_a_failure() {
        assert!(FsnError::ScanInProgress.is_busy());
        assert!(
            !FsnError::FolderNotFound {
                path: PathBuf::new()
            }
            .is_busy()
        );
    }

    #[test]
    fn retryable_errors_are_correct() {
        assert!(
            FsnError::StoreIo {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            }
            .is_retryable()
        );
        assert!(FsnError::ScanInProgress.is_retryable());

        assert!(
            !FsnError::InvalidConfig {
                details: String::new()
            }
            .is_retryable()
        );
        assert!(
            !FsnError::DuplicateFolder {
                path: PathBuf::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn store_io_convenience_constructor() {
        let err = FsnError::store_io(
            "/tmp/state.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "FSN-2001");
        assert!(err.to_string().contains("/tmp/state.json"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: FsnError = json_err.into();
        assert_eq!(err.code(), "FSN-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: FsnError = toml_err.into();
        assert_eq!(err.code(), "FSN-1003");
    }
}
