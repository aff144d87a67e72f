//! CloudFront distribution management

mod convert;
mod operations;

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::classify_sdk_error;
use aws_sdk_cloudfront::Client;
use aws_sdk_cloudfront::types::DistributionConfig;
use cf_teardown_common::{
    ConcurrencyToken, DistributionId, DistributionResource, DistributionSnapshot, TeardownError,
};
use tracing::{debug, info};

/// CloudFront client for tearing down distributions
pub struct CloudFrontClient {
    pub(crate) client: Client,
}

impl FromAwsContext for CloudFrontClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudfront_client(),
        }
    }
}

fn missing(what: &str, id: &DistributionId) -> TeardownError {
    TeardownError::Sdk {
        code: None,
        message: format!("CloudFront response for '{id}' is missing {what}"),
    }
}

impl CloudFrontClient {
    /// Create a new CloudFront client (loads AWS config from environment)
    pub async fn new(region: &str) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Read a distribution and the ETag it was read at
    pub async fn get_distribution(
        &self,
        id: &DistributionId,
    ) -> Result<DistributionSnapshot, TeardownError> {
        let response = self
            .client
            .get_distribution()
            .id(id.as_str())
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, id, None))?;

        let token = response
            .e_tag()
            .map(ConcurrencyToken::new)
            .ok_or_else(|| missing("an ETag", id))?;
        let distribution = response
            .distribution()
            .ok_or_else(|| missing("the distribution", id))?;
        let config = distribution
            .distribution_config()
            .ok_or_else(|| missing("the distribution config", id))?;

        let resource = convert::resource_from_config(id, distribution.status(), config)?;
        debug!(
            distribution_id = %id,
            status = %resource.status,
            token = %token,
            "Read distribution"
        );

        Ok(DistributionSnapshot { resource, token })
    }

    async fn get_config(
        &self,
        id: &DistributionId,
    ) -> Result<(DistributionConfig, ConcurrencyToken), TeardownError> {
        let response = self
            .client
            .get_distribution_config()
            .id(id.as_str())
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, id, None))?;

        let token = response
            .e_tag()
            .map(ConcurrencyToken::new)
            .ok_or_else(|| missing("an ETag", id))?;
        let config = response
            .distribution_config()
            .cloned()
            .ok_or_else(|| missing("the distribution config", id))?;

        Ok((config, token))
    }

    /// Submit a conditional update of the distribution's binding fields.
    ///
    /// The model only carries the fields teardown touches, so the full config
    /// is fetched and patched. If that fetch returns a different ETag than
    /// `token`, the write is refused as a conflict without being sent.
    pub async fn update_distribution(
        &self,
        id: &DistributionId,
        resource: &DistributionResource,
        token: &ConcurrencyToken,
    ) -> Result<ConcurrencyToken, TeardownError> {
        let (mut config, current) = self.get_config(id).await?;
        if current != *token {
            return Err(TeardownError::ConcurrencyConflict {
                distribution_id: id.to_string(),
                token: token.to_string(),
            });
        }

        convert::apply_resource(&mut config, resource)?;

        let response = self
            .client
            .update_distribution()
            .id(id.as_str())
            .if_match(token.as_str())
            .distribution_config(config)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, id, Some(token.as_str())))?;

        let new_token = response
            .e_tag()
            .map(ConcurrencyToken::new)
            .ok_or_else(|| missing("an ETag", id))?;
        info!(
            distribution_id = %id,
            old_token = %token,
            new_token = %new_token,
            "Submitted distribution update"
        );

        Ok(new_token)
    }

    /// Delete the distribution conditionally on `token`
    pub async fn delete_distribution(
        &self,
        id: &DistributionId,
        token: &ConcurrencyToken,
    ) -> Result<(), TeardownError> {
        self.client
            .delete_distribution()
            .id(id.as_str())
            .if_match(token.as_str())
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e, id, Some(token.as_str())))?;

        info!(distribution_id = %id, token = %token, "Deleted distribution");
        Ok(())
    }
}
