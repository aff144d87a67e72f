//! Distribution provider contract
//!
//! Abstracts the three CloudFront calls teardown needs so the orchestration
//! logic can run against the real SDK client or an in-memory fake.

use std::future::Future;

use crate::distribution::{ConcurrencyToken, DistributionResource, DistributionSnapshot};
use crate::error::TeardownError;
use crate::identifier::DistributionId;

/// Trait for distribution operations that can be faked in tests.
///
/// Every mutating call is conditional on `token`; a stale token fails with
/// [`TeardownError::ConcurrencyConflict`] and leaves the resource untouched.
pub trait DistributionOperations: Send + Sync {
    /// Read the current resource and its concurrency token
    fn get_distribution(
        &self,
        id: &DistributionId,
    ) -> impl Future<Output = Result<DistributionSnapshot, TeardownError>> + Send;

    /// Replace the resource's binding fields, returning the new token.
    ///
    /// On success the distribution transitions to `InProgress`.
    fn update_distribution(
        &self,
        id: &DistributionId,
        resource: &DistributionResource,
        token: &ConcurrencyToken,
    ) -> impl Future<Output = Result<ConcurrencyToken, TeardownError>> + Send;

    /// Schedule deletion of the distribution
    fn delete_distribution(
        &self,
        id: &DistributionId,
        token: &ConcurrencyToken,
    ) -> impl Future<Output = Result<(), TeardownError>> + Send;
}
