//! Provider trait implementation for the SDK-backed client

use super::CloudFrontClient;
use cf_teardown_common::{
    ConcurrencyToken, DistributionId, DistributionOperations, DistributionResource,
    DistributionSnapshot, TeardownError,
};

impl DistributionOperations for CloudFrontClient {
    async fn get_distribution(
        &self,
        id: &DistributionId,
    ) -> Result<DistributionSnapshot, TeardownError> {
        CloudFrontClient::get_distribution(self, id).await
    }

    async fn update_distribution(
        &self,
        id: &DistributionId,
        resource: &DistributionResource,
        token: &ConcurrencyToken,
    ) -> Result<ConcurrencyToken, TeardownError> {
        CloudFrontClient::update_distribution(self, id, resource, token).await
    }

    async fn delete_distribution(
        &self,
        id: &DistributionId,
        token: &ConcurrencyToken,
    ) -> Result<(), TeardownError> {
        CloudFrontClient::delete_distribution(self, id, token).await
    }
}
