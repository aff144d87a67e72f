//! AWS SDK error classification
//!
//! Maps CloudFront SDK failures onto [`TeardownError`] using the `.code()`
//! from `ProvideErrorMetadata` instead of string matching on Debug output.

use aws_sdk_cloudfront::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use cf_teardown_common::{TeardownError, classify_error};
use std::error::Error as StdError;

/// Classify a modeled CloudFront operation error by its error code.
pub fn classify_operation_error<E>(
    err: &E,
    distribution_id: &str,
    token: Option<&str>,
) -> TeardownError
where
    E: ProvideErrorMetadata,
{
    classify_error(err.code(), err.message(), distribution_id, token)
}

/// Classify any SDK failure, including transport-level ones.
///
/// Timeouts and dispatch failures never reached the service and are safe to
/// retry; service errors are classified by code.
pub fn classify_sdk_error<E, R>(
    err: &SdkError<E, R>,
    distribution_id: &str,
    token: Option<&str>,
) -> TeardownError
where
    E: ProvideErrorMetadata + StdError + 'static,
    R: std::fmt::Debug,
{
    if let Some(service_err) = err.as_service_error() {
        return classify_operation_error(service_err, distribution_id, token);
    }

    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => TeardownError::Transient {
            message: DisplayErrorContext(err).to_string(),
        },
        _ => TeardownError::Sdk {
            code: None,
            message: DisplayErrorContext(err).to_string(),
        },
    }
}
