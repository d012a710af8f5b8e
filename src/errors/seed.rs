//! Loader error types
//!
//! A `SeedError` always means the run stopped. Store failures carry the phase
//! they happened in, so an operator knows how far the backend got before it
//! has to be cleared and seeded again.

use std::fmt;

use thiserror::Error;

use super::StoreError;
use crate::data_loader::Phase;
use crate::dataset::DatasetIssue;

/// Which name map a reference was looked up in
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReferenceKind {
    Category,
    Customization,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Category => write!(f, "category"),
            ReferenceKind::Customization => write!(f, "customization"),
        }
    }
}

/// Dataset loader errors
#[derive(Error, Debug)]
pub enum SeedError {
    /// Configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset file could not be parsed
    #[error("Failed to parse dataset: {0}")]
    DatasetParse(#[from] serde_json::Error),

    /// Dataset parsed but failed validation
    #[error("Invalid dataset ({} issue(s)): {}", .0.len(), summarize(.0))]
    InvalidDataset(Vec<DatasetIssue>),

    /// A name did not resolve to an id created earlier in the run
    #[error("Unknown {kind} '{name}' referenced by menu item '{item}'")]
    UnknownReference {
        kind: ReferenceKind,
        name: String,
        item: String,
    },

    /// Backend call failed
    #[error("{phase} phase failed: {source}")]
    Store {
        phase: Phase,
        #[source]
        source: StoreError,
    },

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn summarize(issues: &[DatasetIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SeedError {
    pub fn store(phase: Phase, source: StoreError) -> Self {
        SeedError::Store { phase, source }
    }

    /// Phase the run stopped in, when the failure came from the backend
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SeedError::Store { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    pub fn is_store_error(&self) -> bool {
        matches!(self, SeedError::Store { .. })
    }

    /// Check if the failure is in the dataset rather than the backend
    pub fn is_dataset_error(&self) -> bool {
        matches!(
            self,
            SeedError::DatasetParse(_)
                | SeedError::InvalidDataset(_)
                | SeedError::UnknownReference { .. }
        )
    }

    /// Stable code for log lines and exit reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            SeedError::Config(_) => "CONFIG_ERROR",
            SeedError::DatasetParse(_) | SeedError::InvalidDataset(_) => "INVALID_DATASET",
            SeedError::UnknownReference { .. } => "UNKNOWN_REFERENCE",
            SeedError::Store { source, .. } if source.is_auth_error() => "UNAUTHORIZED",
            SeedError::Store { .. } => "BACKEND_ERROR",
            SeedError::Io(_) => "IO_ERROR",
        }
    }
}
