//! Distribution object model
//!
//! A provider-neutral view of a CloudFront distribution restricted to the
//! fields teardown reads or mutates.

use serde::{Deserialize, Serialize};

use crate::identifier::DistributionId;

/// Opaque optimistic-concurrency token (CloudFront `ETag` / `If-Match`).
///
/// Only the token returned by the most recent successful read or write is
/// valid for the next mutation.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display, derive_more::Deref,
)]
#[serde(transparent)]
pub struct ConcurrencyToken(String);

impl ConcurrencyToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Propagation status of a distribution
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum DistributionStatus {
    /// A configuration change is still propagating to the edge
    InProgress,
    /// Terminal state: the last change is fully deployed
    Deployed,
}

impl DistributionStatus {
    /// Whether the provider will accept a mutation or delete in this state
    pub fn is_deployed(self) -> bool {
        matches!(self, Self::Deployed)
    }
}

/// An origin of the distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub id: String,
    /// Origin access control ID; `Some("")` once explicitly cleared
    pub access_control_binding_ref: Option<String>,
}

impl Origin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            access_control_binding_ref: None,
        }
    }

    pub fn with_access_control(mut self, binding: impl Into<String>) -> Self {
        self.access_control_binding_ref = Some(binding.into());
        self
    }

    /// The bound access-control reference, if any
    pub fn access_control_binding(&self) -> Option<&str> {
        self.access_control_binding_ref
            .as_deref()
            .filter(|r| !r.is_empty())
    }
}

/// Firewall binding state, derived from `firewall_policy_ref`.
///
/// The provider distinguishes a field that was never set from one that was
/// explicitly cleared to the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallBinding<'a> {
    NeverSet,
    Cleared,
    Bound(&'a str),
}

impl std::fmt::Display for FirewallBinding<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NeverSet => f.write_str("never set"),
            Self::Cleared => f.write_str("cleared"),
            Self::Bound(policy) => write!(f, "bound ({policy})"),
        }
    }
}

/// CloudFront distribution as seen by teardown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionResource {
    pub id: DistributionId,
    pub enabled: bool,
    pub status: DistributionStatus,
    pub origins: Vec<Origin>,
    /// Web ACL reference; `Some("")` is the explicit "unbound" sentinel
    pub firewall_policy_ref: Option<String>,
}

impl DistributionResource {
    pub fn firewall_binding(&self) -> FirewallBinding<'_> {
        match self.firewall_policy_ref.as_deref() {
            None => FirewallBinding::NeverSet,
            Some("") => FirewallBinding::Cleared,
            Some(policy) => FirewallBinding::Bound(policy),
        }
    }

    pub fn has_access_control_bindings(&self) -> bool {
        self.origins
            .iter()
            .any(|o| o.access_control_binding().is_some())
    }

    pub fn has_firewall_binding(&self) -> bool {
        matches!(self.firewall_binding(), FirewallBinding::Bound(_))
    }

    /// Whether any dependent binding still blocks deletion
    pub fn has_dependent_bindings(&self) -> bool {
        self.has_access_control_bindings() || self.has_firewall_binding()
    }
}

/// A resource read together with the token it was read at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionSnapshot {
    pub resource: DistributionResource,
    pub token: ConcurrencyToken,
}
