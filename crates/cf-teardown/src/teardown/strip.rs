//! Binding removal
//!
//! Pure functions computing the patched resource for each mutating stage.
//! Cleared references are written as the explicit empty string, which the
//! provider treats as "unbound" (an absent field would mean "leave as is").

use cf_teardown_common::DistributionResource;

/// A patched resource and whether it differs from the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StripOutcome {
    pub resource: DistributionResource,
    pub changed: bool,
}

/// Clear every non-empty origin access-control reference.
pub fn strip_access_control(resource: &DistributionResource) -> StripOutcome {
    let mut patched = resource.clone();
    let mut changed = false;

    for origin in &mut patched.origins {
        if origin.access_control_binding().is_some() {
            origin.access_control_binding_ref = Some(String::new());
            changed = true;
        }
    }

    StripOutcome {
        resource: patched,
        changed,
    }
}

/// Replace a bound firewall policy with the empty sentinel.
pub fn strip_firewall(resource: &DistributionResource) -> StripOutcome {
    let mut patched = resource.clone();
    let changed = resource.has_firewall_binding();
    if changed {
        patched.firewall_policy_ref = Some(String::new());
    }

    StripOutcome {
        resource: patched,
        changed,
    }
}

/// Remove all dependent bindings in one patch.
pub fn strip(resource: &DistributionResource) -> StripOutcome {
    let access = strip_access_control(resource);
    let firewall = strip_firewall(&access.resource);

    StripOutcome {
        resource: firewall.resource,
        changed: access.changed || firewall.changed,
    }
}

/// Turn the distribution off ahead of deletion.
pub fn disable(resource: &DistributionResource) -> StripOutcome {
    let mut patched = resource.clone();
    patched.enabled = false;

    StripOutcome {
        resource: patched,
        changed: resource.enabled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_teardown_common::{DistributionId, DistributionStatus, FirewallBinding, Origin};

    fn bound() -> DistributionResource {
        DistributionResource {
            id: DistributionId::parse("EDFDVBD6EXAMPLE").unwrap(),
            enabled: true,
            status: DistributionStatus::Deployed,
            origins: vec![
                Origin::new("o1").with_access_control("oac-1"),
                Origin::new("o2"),
                Origin::new("o3").with_access_control("oac-2"),
            ],
            firewall_policy_ref: Some("waf-1".to_string()),
        }
    }

    #[test]
    fn access_control_refs_are_cleared_not_removed() {
        let outcome = strip_access_control(&bound());

        assert!(outcome.changed);
        assert!(!outcome.resource.has_access_control_bindings());
        assert_eq!(
            outcome.resource.origins[0].access_control_binding_ref.as_deref(),
            Some("")
        );
        // Never-bound origins are left alone
        assert_eq!(outcome.resource.origins[1].access_control_binding_ref, None);
        // Firewall is a separate stage
        assert_eq!(outcome.resource.firewall_binding(), FirewallBinding::Bound("waf-1"));
    }

    #[test]
    fn firewall_is_cleared_to_empty_sentinel() {
        let outcome = strip_firewall(&bound());

        assert!(outcome.changed);
        assert_eq!(outcome.resource.firewall_binding(), FirewallBinding::Cleared);
        assert!(outcome.resource.has_access_control_bindings());
    }

    #[test]
    fn strip_is_idempotent() {
        let first = strip(&bound());
        assert!(first.changed);
        assert!(!first.resource.has_dependent_bindings());

        let second = strip(&first.resource);
        assert!(!second.changed);
        assert_eq!(second.resource, first.resource);
    }

    #[test]
    fn never_set_firewall_is_not_a_change() {
        let mut resource = bound();
        resource.firewall_policy_ref = None;

        let outcome = strip_firewall(&resource);
        assert!(!outcome.changed);
        assert_eq!(outcome.resource.firewall_binding(), FirewallBinding::NeverSet);
    }

    #[test]
    fn disable_only_changes_enabled_distributions() {
        let outcome = disable(&bound());
        assert!(outcome.changed);
        assert!(!outcome.resource.enabled);

        assert!(!disable(&outcome.resource).changed);
    }
}
