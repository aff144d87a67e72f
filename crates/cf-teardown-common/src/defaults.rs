//! Default configuration values shared across cf-teardown crates

/// CloudFront's control plane lives in us-east-1 regardless of edge locations
pub const DEFAULT_CLOUDFRONT_REGION: &str = "us-east-1";

/// Initial delay between propagation polls in seconds
pub const DEFAULT_POLL_INITIAL_DELAY_SECS: u64 = 5;

/// Cap on the exponential poll delay in seconds
pub const DEFAULT_POLL_MAX_DELAY_SECS: u64 = 30;

/// Propagation wait budget in seconds (10 minutes)
pub const DEFAULT_PROPAGATION_TIMEOUT_SECS: u64 = 600;

/// Maximum propagation polls per wait
pub const DEFAULT_PROPAGATION_MAX_ATTEMPTS: u32 = 200;

/// Retries of a read that failed transiently
pub const DEFAULT_READ_RETRIES: usize = 3;

/// Re-read-and-recompute attempts after a concurrency conflict
pub const DEFAULT_CONFLICT_RETRIES: u32 = 1;

/// Default harness JSON report path
pub const DEFAULT_REPORT_PATH: &str = "test-report.json";

/// Default harness HTML report path
pub const DEFAULT_HTML_PATH: &str = "test-report.html";
