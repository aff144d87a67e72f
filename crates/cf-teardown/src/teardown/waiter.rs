//! Propagation waiting

use crate::wait::{WaitConfig, WaitError, wait_for_resource};
use cf_teardown_common::{DistributionId, DistributionOperations, DistributionSnapshot, TeardownError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Poll until the distribution reports `Deployed`.
///
/// Transient read failures count as "not yet"; any other read error ends the
/// wait. Once the budget is spent no further read is issued.
pub async fn wait_for_deployed<D: DistributionOperations>(
    api: &D,
    id: &DistributionId,
    config: &WaitConfig,
    cancel: Option<&CancellationToken>,
) -> Result<DistributionSnapshot, TeardownError> {
    let resource_name = format!("distribution {id}");

    let result = wait_for_resource(
        config,
        cancel,
        || async move {
            match api.get_distribution(id).await {
                Ok(snapshot) if snapshot.resource.status.is_deployed() => Ok(Some(snapshot)),
                Ok(snapshot) => {
                    debug!(
                        distribution_id = %id,
                        status = %snapshot.resource.status,
                        "Change still propagating"
                    );
                    Ok(None)
                }
                Err(e) if e.is_retryable() => {
                    warn!(distribution_id = %id, error = %e, "Transient error while polling");
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        },
        &resource_name,
    )
    .await;

    match result {
        Ok(snapshot) => {
            info!(distribution_id = %id, token = %snapshot.token, "Distribution deployed");
            Ok(snapshot)
        }
        Err(WaitError::Timeout {
            waited, attempts, ..
        }) => Err(TeardownError::PropagationTimeout {
            distribution_id: id.to_string(),
            waited,
            attempts,
        }),
        Err(WaitError::Cancelled { .. }) => Err(TeardownError::Cancelled),
        Err(WaitError::Check(e)) => Err(e),
    }
}
