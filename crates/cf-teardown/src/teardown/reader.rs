//! Distribution reads with transient-failure retry

use backon::{ExponentialBuilder, Retryable};
use cf_teardown_common::{DistributionId, DistributionOperations, DistributionSnapshot, TeardownError};
use std::time::Duration;
use tracing::{debug, warn};

/// Read the current snapshot, retrying throttling and network failures.
///
/// Anything other than [`TeardownError::Transient`] is returned on first
/// occurrence. Every returned snapshot is stale the moment another writer
/// touches the distribution.
pub async fn read_distribution<D: DistributionOperations>(
    api: &D,
    id: &DistributionId,
    retries: usize,
) -> Result<DistributionSnapshot, TeardownError> {
    let snapshot = (|| async move { api.get_distribution(id).await })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(500))
                .with_max_delay(Duration::from_secs(5))
                .with_max_times(retries),
        )
        .when(TeardownError::is_retryable)
        .notify(|e, dur| {
            warn!(
                distribution_id = %id,
                delay = ?dur,
                error = %e,
                "Transient read failure, retrying..."
            );
        })
        .await?;

    debug!(
        distribution_id = %id,
        status = %snapshot.resource.status,
        token = %snapshot.token,
        "Read distribution snapshot"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_teardown_test_utils::{FakeCloudFront, Op, bound_distribution};

    fn id() -> DistributionId {
        DistributionId::parse("EDIST1").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_configured_retries() {
        let fake = FakeCloudFront::new(bound_distribution("EDIST1"));
        for _ in 0..3 {
            fake.fail_next(
                Op::Get,
                TeardownError::Transient {
                    message: "connection reset".to_string(),
                },
            );
        }

        let err = read_distribution(&fake, &id(), 2).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(fake.call_count(Op::Get), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permission_errors_are_not_retried() {
        let fake = FakeCloudFront::new(bound_distribution("EDIST1"));
        fake.fail_next(
            Op::Get,
            TeardownError::PermissionDenied {
                message: "cloudfront:GetDistribution".to_string(),
            },
        );

        let err = read_distribution(&fake, &id(), 3).await.unwrap_err();
        assert!(matches!(err, TeardownError::PermissionDenied { .. }));
        assert_eq!(fake.call_count(Op::Get), 1);
    }
}
