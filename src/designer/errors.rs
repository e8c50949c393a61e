//! Designer errors

use thiserror::Error;
use uuid::Uuid;

use crate::lock::LockError;
use crate::schema::{IssueKind, ValidationReport};

pub type DesignResult<T> = Result<T, DesignError>;

#[derive(Debug, Clone, Error)]
pub enum DesignError {
    /// The change was checked and rejected
    #[error("Validation failed: {0}")]
    Validation(ValidationReport),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
}

impl DesignError {
    pub(crate) fn table_not_found(id: Uuid) -> Self {
        DesignError::NotFound { entity: "table", id }
    }

    pub(crate) fn field_not_found(id: Uuid) -> Self {
        DesignError::NotFound { entity: "field", id }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DesignError::Validation(report) => report
                .errors
                .first()
                .map_or("SG_VALIDATION", |issue| issue.kind.code()),
            DesignError::Lock(err) => err.code(),
            DesignError::NotFound { .. } => IssueKind::NotFound.code(),
        }
    }

    /// True when retrying after other collaborators finish may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            DesignError::Validation(report) => {
                !report.errors.is_empty() && report.errors.iter().all(|e| e.kind.is_transient())
            }
            DesignError::Lock(err) => err.is_transient(),
            DesignError::NotFound { .. } => false,
        }
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            DesignError::Validation(report) => Some(report),
            _ => None,
        }
    }
}
