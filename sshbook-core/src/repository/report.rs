//! Outcome of the sidecar side effects of a config mutation

use std::fmt;

use crate::error::RepositoryResult;

/// What happened to one sidecar store during a config mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuxiliaryOutcome {
    /// The store was changed
    Applied,
    /// Nothing needed to change
    Skipped,
    /// The store could not be changed; the config change still stands
    Failed(String),
}

impl AuxiliaryOutcome {
    /// Maps a store result, where `Ok(false)` means there was nothing to do
    pub(crate) fn from_result(
        store: &'static str,
        identity: &str,
        result: RepositoryResult<bool>,
    ) -> Self {
        match result {
            Ok(true) => Self::Applied,
            Ok(false) => Self::Skipped,
            Err(e) => {
                tracing::error!(store, identity, error = %e, "Sidecar update failed");
                Self::Failed(e.to_string())
            }
        }
    }

    /// Combines two outcomes for the same store
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Failed(a), Self::Failed(b)) => Self::Failed(format!("{a}; {b}")),
            (Self::Failed(reason), _) | (_, Self::Failed(reason)) => Self::Failed(reason),
            (Self::Applied, _) | (_, Self::Applied) => Self::Applied,
            (Self::Skipped, Self::Skipped) => Self::Skipped,
        }
    }

    /// Returns true for `Failed`
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for AuxiliaryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Result of a successful config mutation
///
/// The config change itself has been committed when a report is returned.
/// The fields describe the best-effort updates of the sidecar stores.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct MutationReport {
    /// Metadata store outcome
    pub metadata: AuxiliaryOutcome,
    /// Secret store outcome
    pub secret: AuxiliaryOutcome,
}

impl MutationReport {
    /// Returns true if no sidecar update failed
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        !self.metadata.is_failed() && !self.secret.is_failed()
    }

    /// Failed sidecar updates as `(store, reason)` pairs
    #[must_use]
    pub fn failures(&self) -> Vec<(&'static str, &str)> {
        [("metadata", &self.metadata), ("secret", &self.secret)]
            .into_iter()
            .filter_map(|(store, outcome)| match outcome {
                AuxiliaryOutcome::Failed(reason) => Some((store, reason.as_str())),
                _ => None,
            })
            .collect()
    }
}
