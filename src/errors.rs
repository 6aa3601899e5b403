//! Typed error hierarchy for the campaign engine.
//!
//! Three top-level enums cover the three subsystems:
//! - `OrchestratorError` — operations rejected or failed at the engine surface
//! - `PhaseError` — failures of a phase's primary deliverable generation
//! - `StoreError` — snapshot persistence failures

use thiserror::Error;

use crate::phase::Phase;

/// Errors from the public orchestrator operations.
///
/// Precondition failures on resume/refine/cancel are not errors: those
/// operations report them as `Ok(false)`.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Campaign {id} not found")]
    CampaignNotFound { id: String },

    #[error("Campaign brief must not be empty")]
    EmptyBrief,

    #[error("Campaign state lock poisoned")]
    LockPoisoned,

    #[error("Snapshot store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrchestratorError {
    pub fn not_found(id: &str) -> Self {
        Self::CampaignNotFound { id: id.to_string() }
    }
}

/// Errors from a single phase execution. Any of these moves the campaign to `failed`.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("Agent invocation for phase {phase} failed: {message}")]
    InvocationFailed { phase: Phase, message: String },

    #[error("Quality gate for phase {phase} failed: {message}")]
    QualityGateFailed { phase: Phase, message: String },
}

impl PhaseError {
    pub fn phase(&self) -> Phase {
        match self {
            Self::InvocationFailed { phase, .. } | Self::QualityGateFailed { phase, .. } => *phase,
        }
    }
}

/// Errors from the snapshot store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access snapshot at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode or decode snapshot {id}: {source}")]
    Serde {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Snapshot store lock poisoned")]
    LockPoisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_not_found_carries_id() {
        let err = OrchestratorError::not_found("abc-123");
        match &err {
            OrchestratorError::CampaignNotFound { id } => assert_eq!(id, "abc-123"),
            _ => panic!("Expected CampaignNotFound"),
        }
        assert!(err.to_string().contains("abc-123"));
    }

    #[test]
    fn phase_error_reports_its_phase() {
        let err = PhaseError::InvocationFailed {
            phase: Phase::Trending,
            message: "timed out".into(),
        };
        assert_eq!(err.phase(), Phase::Trending);
        assert!(err.to_string().contains("trending"));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn store_error_converts_into_orchestrator_error() {
        let inner = StoreError::LockPoisoned;
        let err: OrchestratorError = inner.into();
        assert!(matches!(err, OrchestratorError::Store(StoreError::LockPoisoned)));
    }

    #[test]
    fn store_io_error_carries_path() {
        let path = std::path::PathBuf::from("/snapshots/abc.json");
        let err = StoreError::Io {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        match &err {
            StoreError::Io { path: p, source } => {
                assert_eq!(p, &path);
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected Io"),
        }
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&OrchestratorError::EmptyBrief);
        assert_std_error(&PhaseError::QualityGateFailed {
            phase: Phase::Story,
            message: "x".into(),
        });
        assert_std_error(&StoreError::LockPoisoned);
    }
}
