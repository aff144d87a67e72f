//! Conversion between SDK distribution types and the teardown model

use aws_sdk_cloudfront::types::DistributionConfig;
use cf_teardown_common::{
    DistributionId, DistributionResource, DistributionStatus, Origin, TeardownError,
};

/// Build the teardown view of a distribution from its SDK config and status.
pub(crate) fn resource_from_config(
    id: &DistributionId,
    status: &str,
    config: &DistributionConfig,
) -> Result<DistributionResource, TeardownError> {
    let status: DistributionStatus = status.parse().map_err(|_| TeardownError::Sdk {
        code: None,
        message: format!("Unrecognized distribution status '{status}' for '{id}'"),
    })?;

    let origins = config
        .origins()
        .map(|origins| {
            origins
                .items()
                .iter()
                .map(|o| Origin {
                    id: o.id().to_string(),
                    access_control_binding_ref: o.origin_access_control_id().map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(DistributionResource {
        id: id.clone(),
        enabled: config.enabled(),
        status,
        origins,
        firewall_policy_ref: config.web_acl_id().map(str::to_string),
    })
}

/// Write the model's mutable fields back onto a full SDK config.
///
/// Everything teardown does not model is left exactly as read. Origins are
/// matched by ID; a model origin the config does not carry is rejected.
pub(crate) fn apply_resource(
    config: &mut DistributionConfig,
    resource: &DistributionResource,
) -> Result<(), TeardownError> {
    config.enabled = resource.enabled;
    config.web_acl_id = resource.firewall_policy_ref.clone();

    for wanted in &resource.origins {
        let origin = config
            .origins
            .as_mut()
            .and_then(|origins| origins.items.iter_mut().find(|o| o.id == wanted.id))
            .ok_or_else(|| TeardownError::RejectedUpdate {
                code: None,
                message: format!(
                    "Origin '{}' is not part of distribution '{}'",
                    wanted.id, resource.id
                ),
            })?;
        origin.origin_access_control_id = wanted.access_control_binding_ref.clone();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_cloudfront::types::{
        DefaultCacheBehavior, Origin as SdkOrigin, Origins, ViewerProtocolPolicy,
    };

    fn sdk_origin(id: &str, oac: Option<&str>) -> SdkOrigin {
        SdkOrigin::builder()
            .id(id)
            .domain_name(format!("{id}.s3.amazonaws.com"))
            .set_origin_access_control_id(oac.map(str::to_string))
            .build()
            .unwrap()
    }

    fn sdk_config(web_acl: Option<&str>) -> DistributionConfig {
        let origins = Origins::builder()
            .quantity(2)
            .items(sdk_origin("site", Some("oac-1")))
            .items(sdk_origin("logs", None))
            .build()
            .unwrap();

        DistributionConfig::builder()
            .caller_reference("ref-1")
            .comment("test distribution")
            .enabled(true)
            .origins(origins)
            .default_cache_behavior(
                DefaultCacheBehavior::builder()
                    .target_origin_id("site")
                    .viewer_protocol_policy(ViewerProtocolPolicy::RedirectToHttps)
                    .build()
                    .unwrap(),
            )
            .set_web_acl_id(web_acl.map(str::to_string))
            .build()
            .unwrap()
    }

    fn id() -> DistributionId {
        DistributionId::parse("EDFDVBD6EXAMPLE").unwrap()
    }

    #[test]
    fn reads_bindings_and_status() {
        let resource = resource_from_config(&id(), "InProgress", &sdk_config(Some("waf-1"))).unwrap();

        assert_eq!(resource.status, DistributionStatus::InProgress);
        assert!(resource.enabled);
        assert_eq!(resource.origins.len(), 2);
        assert_eq!(resource.origins[0].access_control_binding(), Some("oac-1"));
        assert_eq!(resource.origins[1].access_control_binding(), None);
        assert_eq!(resource.firewall_policy_ref.as_deref(), Some("waf-1"));
    }

    #[test]
    fn unknown_status_is_an_error() {
        let err = resource_from_config(&id(), "Deleting", &sdk_config(None)).unwrap_err();
        assert!(matches!(err, TeardownError::Sdk { .. }));
    }

    #[test]
    fn apply_clears_bindings_and_keeps_other_fields() {
        let mut config = sdk_config(Some("waf-1"));
        let mut resource = resource_from_config(&id(), "Deployed", &config).unwrap();
        resource.origins[0].access_control_binding_ref = Some(String::new());
        resource.firewall_policy_ref = Some(String::new());
        resource.enabled = false;

        apply_resource(&mut config, &resource).unwrap();

        assert!(!config.enabled());
        assert_eq!(config.web_acl_id(), Some(""));
        let items = config.origins().unwrap().items();
        assert_eq!(items[0].origin_access_control_id(), Some(""));
        assert_eq!(items[0].domain_name(), "site.s3.amazonaws.com");
        assert_eq!(items[1].origin_access_control_id(), None);
        assert_eq!(config.comment(), "test distribution");
    }

    #[test]
    fn apply_rejects_unknown_origin() {
        let mut config = sdk_config(None);
        let mut resource = resource_from_config(&id(), "Deployed", &config).unwrap();
        resource.origins.push(Origin::new("ghost"));

        let err = apply_resource(&mut config, &resource).unwrap_err();
        assert!(matches!(err, TeardownError::RejectedUpdate { .. }));
    }
}
