//! AWS client modules for teardown
//!
//! - cloudfront: Distribution reads, conditional updates and deletes
//! - context: Shared SDK configuration
//! - error: SDK error classification

pub mod cloudfront;
pub mod context;
pub mod error;

pub use cloudfront::CloudFrontClient;
pub use context::{AwsContext, FromAwsContext};
pub use error::{classify_operation_error, classify_sdk_error};
