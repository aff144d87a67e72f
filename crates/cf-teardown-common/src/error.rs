//! Teardown error taxonomy
//!
//! Every provider failure is mapped onto one of these variants by error code,
//! so callers decide retry vs. re-read vs. give up without string matching.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by distribution operations and teardown stages
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeardownError {
    /// Distribution does not exist (already deleted counts as success for delete)
    #[error("Distribution '{distribution_id}' not found")]
    NotFound { distribution_id: String },

    /// Network failure or throttling; safe to retry the read
    #[error("Transient provider error: {message}")]
    Transient { message: String },

    /// The supplied concurrency token is stale; re-read before writing again
    #[error("Concurrency conflict on '{distribution_id}': token '{token}' is stale")]
    ConcurrencyConflict {
        distribution_id: String,
        token: String,
    },

    /// Provider rejected the update; not retryable
    #[error("Update rejected{}: {message}", .code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    RejectedUpdate {
        code: Option<String>,
        message: String,
    },

    /// Distribution did not reach `Deployed` within the wait budget
    #[error(
        "Distribution '{distribution_id}' still propagating after {waited:?} ({attempts} attempts)"
    )]
    PropagationTimeout {
        distribution_id: String,
        waited: Duration,
        attempts: u32,
    },

    /// Delete refused while origins or the distribution still carry bindings
    #[error("Distribution '{distribution_id}' still has dependent bindings")]
    DependentBindingsPresent { distribution_id: String },

    /// Credentials lack permission for the operation
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Delete refused because the distribution is still enabled
    #[error("Distribution '{distribution_id}' must be disabled before deletion")]
    DistributionNotDisabled { distribution_id: String },

    /// Mutation submitted while a previous change is still propagating
    #[error("Distribution '{distribution_id}' has a change in progress")]
    PropagationInProgress { distribution_id: String },

    /// Cancelled at a step boundary
    #[error("Teardown cancelled")]
    Cancelled,

    /// Unclassified provider error
    #[error("Provider error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl TeardownError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Safe to repeat the same call unchanged.
    ///
    /// Conflicts are deliberately excluded: they need a fresh read first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict { .. })
    }
}

/// CloudFront "not found" codes
const NOT_FOUND_CODES: &[&str] = &["NoSuchDistribution", "NoSuchResource"];

/// Stale `If-Match` value
const CONFLICT_CODES: &[&str] = &["PreconditionFailed", "InvalidIfMatchVersion"];

const TRANSIENT_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "ServiceUnavailable",
    "InternalError",
];

const PERMISSION_CODES: &[&str] = &["AccessDenied", "AccessDeniedException"];

const DEPENDENCY_CODES: &[&str] = &["IllegalDelete", "ResourceInUse"];

const REJECTED_CODES: &[&str] = &[
    "InvalidArgument",
    "IllegalUpdate",
    "InconsistentQuantities",
    "InvalidWebACLId",
    "InvalidOriginAccessControl",
    "IllegalOriginAccessConfiguration",
];

/// Classify a provider error from its code and message.
///
/// `token` is the `If-Match` value the failed call was submitted with, if any.
pub fn classify_error(
    code: Option<&str>,
    message: Option<&str>,
    distribution_id: &str,
    token: Option<&str>,
) -> TeardownError {
    let message = message.unwrap_or("Unknown error").to_string();
    let distribution_id = distribution_id.to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => TeardownError::NotFound { distribution_id },
        Some(c) if CONFLICT_CODES.contains(&c) => TeardownError::ConcurrencyConflict {
            distribution_id,
            token: token.unwrap_or_default().to_string(),
        },
        Some(c) if TRANSIENT_CODES.contains(&c) => TeardownError::Transient { message },
        Some(c) if PERMISSION_CODES.contains(&c) => TeardownError::PermissionDenied { message },
        Some(c) if DEPENDENCY_CODES.contains(&c) => {
            TeardownError::DependentBindingsPresent { distribution_id }
        }
        Some("DistributionNotDisabled") => {
            TeardownError::DistributionNotDisabled { distribution_id }
        }
        Some(c) if REJECTED_CODES.contains(&c) => TeardownError::RejectedUpdate {
            code: Some(c.to_string()),
            message,
        },
        _ => TeardownError::Sdk {
            code: code.map(str::to_string),
            message,
        },
    }
}
