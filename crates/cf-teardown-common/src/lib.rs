//! cf-teardown-common - Shared types for CloudFront teardown
//!
//! SDK-free model and contracts used by the orchestrator and its test fakes.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`distribution`]: Distribution, origin, status and concurrency token model
//! - [`error`]: Error taxonomy and provider error-code classification
//! - [`harness`]: Acceptance-harness report configuration and test records
//! - [`identifier`]: Distribution ID / ARN parsing
//! - [`operations`]: Provider trait for get/update/delete

pub mod defaults;
pub mod distribution;
pub mod error;
pub mod harness;
pub mod identifier;
pub mod operations;

// Re-export commonly used types
pub use distribution::{
    ConcurrencyToken, DistributionResource, DistributionSnapshot, DistributionStatus,
    FirewallBinding, Origin,
};
pub use error::{TeardownError, classify_error};
pub use harness::{ConfigError, HarnessConfig, TestRecord, TestStatus};
pub use identifier::{DistributionArn, DistributionId, MalformedIdentifier};
pub use operations::DistributionOperations;
