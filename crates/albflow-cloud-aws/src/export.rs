//! Live state → spec export
//!
//! Collapses per-region live load balancers into one spec: the first region
//! (by name) supplies the top-level fields and every other region only gets
//! an override for the fields that really differ from it.

use crate::cloud::NetworkLookup;
use crate::error::{AlbError, Result};
use crate::fetcher::CurrentStateFetcher;
use crate::model::{
    ApplicationLoadBalancer, ApplicationLoadBalancerOverride, ApplicationLoadBalancerSpec,
    Moniker, SubnetAwareLocations, SubnetAwareRegionSpec,
};
use albflow_cloud::ExportRequest;
use futures_util::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};

/// Zones to record in an exported spec.
///
/// When the live zones cover every default zone of the subnet the spec gets
/// an empty set ("use the default") so it does not pin zones nobody chose.
/// An unknown (empty) default set never collapses anything.
pub fn normalize_zones(live: &BTreeSet<String>, default: &BTreeSet<String>) -> BTreeSet<String> {
    if !default.is_empty() && live.is_superset(default) {
        BTreeSet::new()
    } else {
        live.clone()
    }
}

/// `Some(candidate)` when it differs from `base`, `None` otherwise
pub fn override_field<T: PartialEq + Clone>(base: &T, candidate: &T) -> Option<T> {
    (base != candidate).then(|| candidate.clone())
}

/// Override carrying only the overridable fields where `candidate` differs
pub fn region_override(
    base: &ApplicationLoadBalancer,
    candidate: &ApplicationLoadBalancer,
) -> Option<ApplicationLoadBalancerOverride> {
    let ov = ApplicationLoadBalancerOverride {
        dependencies: override_field(&base.dependencies, &candidate.dependencies),
        listeners: override_field(&base.listeners, &candidate.listeners),
        target_groups: override_field(&base.target_groups, &candidate.target_groups),
    };
    (!ov.is_empty()).then_some(ov)
}

/// Export the live load balancer described by `request` as a spec
pub async fn export_spec(
    fetcher: &CurrentStateFetcher,
    lookup: &dyn NetworkLookup,
    request: &ExportRequest<Moniker>,
) -> Result<ApplicationLoadBalancerSpec> {
    let name = request.moniker.name();
    let live = fetcher
        .fetch(
            &request.account,
            &name,
            &request.regions,
            &request.service_account,
        )
        .await?;

    let Some((base_region, base)) = live.first_key_value() else {
        return Err(AlbError::ResourceNotFound {
            name,
            account: request.account.clone(),
            regions: request.regions.join(", "),
        });
    };

    let regions = try_join_all(live.values().map(|alb| region_spec(alb, lookup))).await?;

    let overrides: BTreeMap<String, ApplicationLoadBalancerOverride> = live
        .iter()
        .filter(|(region, _)| *region != base_region)
        .filter_map(|(region, alb)| region_override(base, alb).map(|ov| (region.clone(), ov)))
        .collect();

    tracing::info!(
        load_balancer = %name,
        account = %request.account,
        base_region = %base_region,
        regions = live.len(),
        overrides = overrides.len(),
        "Exported application load balancer"
    );

    Ok(ApplicationLoadBalancerSpec {
        moniker: request.moniker.clone(),
        locations: SubnetAwareLocations {
            account: request.account.clone(),
            vpc: Some(base.location.vpc.clone()),
            subnet: Some(base.location.subnet.clone()),
            regions: regions.into_iter().collect(),
        },
        internal: base.internal,
        dependencies: base.dependencies.clone(),
        idle_timeout: base.idle_timeout,
        listeners: base.listeners.clone(),
        target_groups: base.target_groups.clone(),
        overrides,
    })
}

async fn region_spec(
    alb: &ApplicationLoadBalancer,
    lookup: &dyn NetworkLookup,
) -> Result<SubnetAwareRegionSpec> {
    let location = &alb.location;
    let network = lookup
        .network_by_name(&location.vpc, &location.account, &location.region)
        .await?;
    let default_zones = lookup
        .availability_zones(
            &location.account,
            &network.id,
            &location.subnet,
            &location.region,
        )
        .await?;

    Ok(SubnetAwareRegionSpec {
        name: location.region.clone(),
        availability_zones: normalize_zones(&location.availability_zones, &default_zones),
    })
}
