//! cf-teardown - CloudFront distribution decommissioning
//!
//! Strips origin access-control and web ACL bindings from a distribution,
//! waits for each change to propagate, then deletes it under CloudFront's
//! ETag-based optimistic concurrency.

pub mod aws;
pub mod config;
pub mod teardown;
pub mod wait;
