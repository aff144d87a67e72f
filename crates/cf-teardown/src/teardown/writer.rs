//! Conditional writes

use cf_teardown_common::{
    ConcurrencyToken, DistributionId, DistributionOperations, DistributionResource, TeardownError,
};
use tracing::{info, warn};

/// Submit `resource` conditionally on `token`.
///
/// Never retried here: a conflict means the patch was computed from a stale
/// snapshot and has to be recomputed from a fresh read.
pub async fn write_conditional<D: DistributionOperations>(
    api: &D,
    id: &DistributionId,
    resource: &DistributionResource,
    token: &ConcurrencyToken,
) -> Result<ConcurrencyToken, TeardownError> {
    match api.update_distribution(id, resource, token).await {
        Ok(new_token) => {
            info!(
                distribution_id = %id,
                token = %token,
                new_token = %new_token,
                "Update accepted, change is propagating"
            );
            Ok(new_token)
        }
        Err(e) => {
            warn!(distribution_id = %id, token = %token, error = %e, "Update failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_teardown_test_utils::{FakeCloudFront, bound_distribution};

    #[tokio::test]
    async fn stale_token_is_surfaced_as_conflict() {
        let fake = FakeCloudFront::new(bound_distribution("EDIST1"));
        let id = DistributionId::parse("EDIST1").unwrap();
        fake.bump_token();

        let mut patched = bound_distribution("EDIST1");
        patched.firewall_policy_ref = Some(String::new());

        let err = write_conditional(&fake, &id, &patched, &ConcurrencyToken::new("t0"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        // Nothing was applied
        assert_eq!(
            fake.current().unwrap().firewall_policy_ref.as_deref(),
            Some("waf-1")
        );
    }

    #[tokio::test]
    async fn accepted_write_returns_new_token_and_starts_propagation() {
        let fake = FakeCloudFront::new(bound_distribution("EDIST1"));
        let id = DistributionId::parse("EDIST1").unwrap();

        let token = write_conditional(
            &fake,
            &id,
            &bound_distribution("EDIST1"),
            &ConcurrencyToken::new("t0"),
        )
        .await
        .unwrap();

        assert_eq!(token.as_str(), "t1");
        assert_eq!(
            fake.current().unwrap().status,
            cf_teardown_common::DistributionStatus::InProgress
        );
    }
}
