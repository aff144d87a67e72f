//! Shared AWS configuration context
//!
//! Provides `AwsContext` for loading AWS SDK configuration once and
//! creating service clients from the same config.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

/// Shared AWS configuration context for creating service clients.
///
/// # Example
/// ```ignore
/// let aws = AwsContext::with_profile("us-east-1", Some("sandbox")).await;
/// let cloudfront = CloudFrontClient::from_context(&aws);
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Load AWS configuration for the specified region.
    ///
    /// This loads credentials, region configuration, and other AWS SDK
    /// settings from the environment, config files, and IAM roles.
    pub async fn new(region: &str) -> Self {
        Self::with_profile(region, None).await
    }

    /// Load AWS configuration, optionally pinned to a named profile.
    pub async fn with_profile(region: &str, profile: Option<&str>) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }

        Self {
            config: Arc::new(loader.load().await),
            region: region.to_string(),
        }
    }

    /// Get the underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Create a CloudFront client from this context.
    pub fn cloudfront_client(&self) -> aws_sdk_cloudfront::Client {
        aws_sdk_cloudfront::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Service clients that can be built from a loaded [`AwsContext`]
pub trait FromAwsContext: Sized {
    fn from_context(ctx: &AwsContext) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Loading the default chain needs credentials or IMDS; keep these opt-in.

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_context_creation() {
        let ctx = AwsContext::new("us-east-1").await;
        assert_eq!(ctx.region(), "us-east-1");
    }

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_context_debug_hides_config() {
        let ctx = AwsContext::new("us-east-1").await;
        let debug = format!("{ctx:?}");
        assert!(debug.contains("us-east-1"));
        assert!(debug.contains(".."));
    }
}
