//! AWS test utilities
//!
//! Region and target-distribution lookup for live CloudFront tests, plus
//! unique run IDs for naming test artifacts.

use chrono::Utc;
use cf_teardown_common::defaults::DEFAULT_CLOUDFRONT_REGION;

/// Environment variable naming the distribution live tests may tear down
pub const TEST_DISTRIBUTION_ENV: &str = "CF_TEARDOWN_TEST_DISTRIBUTION";

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to us-east-1 (the CloudFront control plane)
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| DEFAULT_CLOUDFRONT_REGION.to_string())
}

/// The distribution ID or ARN a live test is allowed to destroy, if configured
pub fn test_distribution() -> Option<String> {
    std::env::var(TEST_DISTRIBUTION_ENV)
        .ok()
        .filter(|s| !s.trim().is_empty())
}

/// Generate a unique run ID for test artifacts.
///
/// Format: `test-{timestamp_ms}-{counter}`
pub fn test_run_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}", ts, counter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_test_region_default() {
        let original_region = std::env::var("AWS_REGION").ok();
        let original_default = std::env::var("AWS_DEFAULT_REGION").ok();

        // SAFETY: Test-only code; no other test in this crate reads these vars.
        unsafe {
            std::env::remove_var("AWS_REGION");
            std::env::remove_var("AWS_DEFAULT_REGION");
        }

        assert_eq!(get_test_region(), "us-east-1");

        unsafe {
            if let Some(r) = original_region {
                std::env::set_var("AWS_REGION", r);
            }
            if let Some(r) = original_default {
                std::env::set_var("AWS_DEFAULT_REGION", r);
            }
        }
    }

    #[test]
    fn test_run_id_unique() {
        let id1 = test_run_id();
        let id2 = test_run_id();
        assert!(id1.starts_with("test-"));
        assert_ne!(id1, id2);
    }
}
