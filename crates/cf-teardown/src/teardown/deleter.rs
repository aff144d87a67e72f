//! Final deletion

use cf_teardown_common::{ConcurrencyToken, DistributionId, DistributionOperations, TeardownError};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Result of the delete step
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
pub enum DeleteOutcome {
    /// Deletion was accepted (removal is scheduled, not yet complete)
    Deleted,
    /// The distribution was already gone
    AlreadyDeleted,
    /// Deletion was attempted and failed
    Failed,
    /// Deletion was never attempted
    Skipped,
}

impl DeleteOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Deleted | Self::AlreadyDeleted)
    }
}

/// Delete the distribution with the latest token.
///
/// `NotFound` is success: from the caller's side deletion is idempotent.
pub async fn delete_distribution<D: DistributionOperations>(
    api: &D,
    id: &DistributionId,
    token: &ConcurrencyToken,
) -> Result<DeleteOutcome, TeardownError> {
    match api.delete_distribution(id, token).await {
        Ok(()) => {
            info!(distribution_id = %id, token = %token, "Deletion scheduled");
            Ok(DeleteOutcome::Deleted)
        }
        Err(e) if e.is_not_found() => {
            info!(distribution_id = %id, "Distribution already deleted");
            Ok(DeleteOutcome::AlreadyDeleted)
        }
        Err(e) => Err(e),
    }
}
