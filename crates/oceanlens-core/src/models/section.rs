use serde::Serialize;

use crate::error::{ErrorKind, OceanError};

/// Structured error carried inside a report instead of aborting it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisError {
    pub kind: ErrorKind,
    pub message: String,
}

impl AnalysisError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl From<OceanError> for AnalysisError {
    fn from(err: OceanError) -> Self {
        Self { kind: err.kind(), message: err.to_string() }
    }
}

/// One independently computed part of a report.
///
/// Serializes as the value itself, or as `{"error": {"kind": ..., "message": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Section<T> {
    Ready(T),
    Failed { error: AnalysisError },
}

impl<T> Section<T> {
    pub fn failed(error: impl Into<AnalysisError>) -> Self {
        Section::Failed { error: error.into() }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Section::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&AnalysisError> {
        match self {
            Section::Ready(_) => None,
            Section::Failed { error } => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Section<U> {
        match self {
            Section::Ready(value) => Section::Ready(f(value)),
            Section::Failed { error } => Section::Failed { error },
        }
    }
}

impl<T> From<Result<T, OceanError>> for Section<T> {
    fn from(result: Result<T, OceanError>) -> Self {
        match result {
            Ok(value) => Section::Ready(value),
            Err(err) => Section::failed(err),
        }
    }
}
