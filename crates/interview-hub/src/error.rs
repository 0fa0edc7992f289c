use std::fmt;

use crate::config::ConfigError;
use crate::export::ExportError;
use crate::http::ApiError;
use crate::jobs::MailError;
use crate::store::{RepositoryError, SnapshotError};
use crate::telemetry::TelemetryError;

/// Process-level failure reported by the binary before exiting.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Rejected(ApiError),
    Snapshot(SnapshotError),
    Repository(RepositoryError),
    Export(ExportError),
    Mail(MailError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {err}"),
            AppError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            AppError::Io(err) => write!(f, "io error: {err}"),
            AppError::Rejected(err) => write!(f, "record rejected: {err}"),
            AppError::Snapshot(err) => write!(f, "snapshot error: {err}"),
            AppError::Repository(err) => write!(f, "store error: {err}"),
            AppError::Export(err) => write!(f, "export error: {err}"),
            AppError::Mail(err) => write!(f, "mail error: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Rejected(err) => Some(err),
            AppError::Snapshot(err) => Some(err),
            AppError::Repository(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Mail(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Rejected(value)
    }
}

impl From<SnapshotError> for AppError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Repository(value)
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<MailError> for AppError {
    fn from(value: MailError) -> Self {
        Self::Mail(value)
    }
}
