//! Shared test utilities for cf-teardown
//!
//! ## Modules
//!
//! - [`aws`]: Region and target-distribution lookup for live tests
//! - [`fake`]: In-memory CloudFront with ETag and propagation semantics

pub mod aws;
pub mod fake;

// Re-export commonly used items
pub use aws::{get_test_region, test_distribution, test_run_id};
pub use fake::{Call, FakeCloudFront, Op, bound_distribution};
