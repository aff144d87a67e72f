//! Distribution identifiers
//!
//! Provisioning outputs hand us a distribution ARN
//! (`arn:aws:cloudfront::123456789012:distribution/E2QWRUHEXAMPLE`) while the
//! CloudFront API wants the bare ID. These types parse either form and reject
//! anything else with a structured error.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An identifier that could not be parsed as a distribution ID or ARN
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed distribution identifier '{input}': {reason}")]
pub struct MalformedIdentifier {
    pub input: String,
    pub reason: &'static str,
}

impl MalformedIdentifier {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Bare CloudFront distribution ID (e.g. `E2QWRUHEXAMPLE`)
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display, derive_more::Deref,
)]
#[serde(transparent)]
pub struct DistributionId(String);

impl DistributionId {
    /// Parse a bare distribution ID.
    ///
    /// IDs are non-empty and strictly ASCII alphanumeric.
    pub fn parse(input: &str) -> Result<Self, MalformedIdentifier> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(MalformedIdentifier::new(input, "identifier is empty"));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MalformedIdentifier::new(
                input,
                "distribution ID must be ASCII alphanumeric",
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Accept either a bare ID or a full distribution ARN.
    pub fn from_id_or_arn(input: &str) -> Result<Self, MalformedIdentifier> {
        if input.trim_start().starts_with("arn:") {
            DistributionArn::parse(input).map(|arn| arn.distribution_id)
        } else {
            Self::parse(input)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DistributionId {
    type Err = MalformedIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id_or_arn(s)
    }
}

/// Parsed distribution ARN
///
/// Format: `arn:<partition>:cloudfront::<account-id>:distribution/<id>`.
/// CloudFront is a global service so the region segment is always empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionArn {
    pub partition: String,
    pub account_id: String,
    pub distribution_id: DistributionId,
}

impl DistributionArn {
    pub fn parse(input: &str) -> Result<Self, MalformedIdentifier> {
        let trimmed = input.trim();
        let parts: Vec<&str> = trimmed.splitn(6, ':').collect();
        let [prefix, partition, service, region, account_id, resource] = parts.as_slice() else {
            return Err(MalformedIdentifier::new(
                input,
                "ARN must have six ':'-separated fields",
            ));
        };

        if *prefix != "arn" {
            return Err(MalformedIdentifier::new(input, "ARN must start with 'arn'"));
        }
        if partition.is_empty() {
            return Err(MalformedIdentifier::new(input, "ARN partition is empty"));
        }
        if *service != "cloudfront" {
            return Err(MalformedIdentifier::new(
                input,
                "ARN service must be 'cloudfront'",
            ));
        }
        if !region.is_empty() {
            return Err(MalformedIdentifier::new(
                input,
                "CloudFront ARNs carry no region",
            ));
        }
        if account_id.len() != 12 || !account_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(MalformedIdentifier::new(
                input,
                "ARN account ID must be 12 digits",
            ));
        }

        let Some(id) = resource.strip_prefix("distribution/") else {
            return Err(MalformedIdentifier::new(
                input,
                "ARN resource must be 'distribution/<id>'",
            ));
        };
        if id.contains('/') {
            return Err(MalformedIdentifier::new(
                input,
                "ARN resource has trailing path segments",
            ));
        }

        let distribution_id =
            DistributionId::parse(id).map_err(|e| MalformedIdentifier::new(input, e.reason))?;

        Ok(Self {
            partition: partition.to_string(),
            account_id: account_id.to_string(),
            distribution_id,
        })
    }
}

impl FromStr for DistributionArn {
    type Err = MalformedIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for DistributionArn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "arn:{}:cloudfront::{}:distribution/{}",
            self.partition, self.account_id, self.distribution_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARN: &str = "arn:aws:cloudfront::123456789012:distribution/E2QWRUHEXAMPLE";

    #[test]
    fn parses_full_arn() {
        let arn = DistributionArn::parse(ARN).unwrap();
        assert_eq!(arn.partition, "aws");
        assert_eq!(arn.account_id, "123456789012");
        assert_eq!(arn.distribution_id.as_str(), "E2QWRUHEXAMPLE");
        assert_eq!(arn.to_string(), ARN);
    }

    #[test]
    fn id_or_arn_accepts_both_forms() {
        let from_arn: DistributionId = ARN.parse().unwrap();
        let bare: DistributionId = "E2QWRUHEXAMPLE".parse().unwrap();
        assert_eq!(from_arn, bare);
    }

    #[test]
    fn rejects_malformed_input() {
        let cases = [
            ("", "identifier is empty"),
            ("E2QW/RUH", "distribution ID must be ASCII alphanumeric"),
            (
                "arn:aws:s3::123456789012:distribution/E2QW",
                "ARN service must be 'cloudfront'",
            ),
            (
                "arn:aws:cloudfront:us-east-1:123456789012:distribution/E2QW",
                "CloudFront ARNs carry no region",
            ),
            (
                "arn:aws:cloudfront::12345:distribution/E2QW",
                "ARN account ID must be 12 digits",
            ),
            (
                "arn:aws:cloudfront::123456789012:origin-access-control/E2QW",
                "ARN resource must be 'distribution/<id>'",
            ),
            (
                "arn:aws:cloudfront::123456789012:distribution/",
                "identifier is empty",
            ),
            (
                "arn:aws:cloudfront::123456789012:distribution/E2QW/extra",
                "ARN resource has trailing path segments",
            ),
            ("arn:aws:cloudfront", "ARN must have six ':'-separated fields"),
        ];

        for (input, reason) in cases {
            let err = DistributionId::from_id_or_arn(input).unwrap_err();
            assert_eq!(err.reason, reason, "input: {input:?}");
            assert_eq!(err.input, input);
        }
    }

    #[test]
    fn error_display_names_input() {
        let err = DistributionId::parse("bad id").unwrap_err();
        assert!(err.to_string().contains("'bad id'"));
    }
}
