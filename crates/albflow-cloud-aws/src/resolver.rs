//! Desired state resolution
//!
//! Expands a spec into one [`ApplicationLoadBalancer`] per region, applying
//! the region's override where one exists.

use crate::cloud::NetworkLookup;
use crate::error::{AlbError, Result};
use crate::model::{ApplicationLoadBalancer, ApplicationLoadBalancerSpec, Location};
use futures_util::future::try_join_all;
use std::collections::BTreeMap;

/// Resolve the spec into desired state keyed by region name.
///
/// Fails if the spec has no VPC or subnet; that is a gap in the spec, not a
/// transient condition, and must not be retried.
pub fn resolve_desired(
    spec: &ApplicationLoadBalancerSpec,
) -> Result<BTreeMap<String, ApplicationLoadBalancer>> {
    let vpc = spec
        .locations
        .vpc
        .clone()
        .ok_or_else(|| AlbError::MissingNetwork(spec.moniker.name()))?;
    let subnet = spec
        .locations
        .subnet
        .clone()
        .ok_or_else(|| AlbError::MissingSubnet(spec.moniker.name()))?;

    let desired = spec
        .locations
        .regions
        .iter()
        .map(|region| {
            let region_override = spec.overrides.get(&region.name);
            let alb = ApplicationLoadBalancer {
                moniker: spec.moniker.clone(),
                location: Location {
                    account: spec.locations.account.clone(),
                    region: region.name.clone(),
                    vpc: vpc.clone(),
                    subnet: subnet.clone(),
                    availability_zones: region.availability_zones.clone(),
                },
                internal: spec.internal,
                dependencies: region_override
                    .and_then(|o| o.dependencies.clone())
                    .unwrap_or_else(|| spec.dependencies.clone()),
                idle_timeout: spec.idle_timeout,
                listeners: region_override
                    .and_then(|o| o.listeners.clone())
                    .unwrap_or_else(|| spec.listeners.clone()),
                target_groups: region_override
                    .and_then(|o| o.target_groups.clone())
                    .unwrap_or_else(|| spec.target_groups.clone()),
            };
            (region.name.clone(), alb)
        })
        .collect();

    Ok(desired)
}

/// Fill every empty availability-zone set with the zones the subnet spans.
///
/// An empty set in a spec means "platform default"; comparing it with live
/// state requires the concrete zones.
pub async fn with_default_zones(
    spec: &ApplicationLoadBalancerSpec,
    lookup: &dyn NetworkLookup,
) -> Result<ApplicationLoadBalancerSpec> {
    if spec
        .locations
        .regions
        .iter()
        .all(|r| !r.availability_zones.is_empty())
    {
        return Ok(spec.clone());
    }

    let vpc = spec
        .locations
        .vpc
        .as_deref()
        .ok_or_else(|| AlbError::MissingNetwork(spec.moniker.name()))?;
    let subnet = spec
        .locations
        .subnet
        .as_deref()
        .ok_or_else(|| AlbError::MissingSubnet(spec.moniker.name()))?;
    let account = spec.locations.account.as_str();

    let regions = try_join_all(spec.locations.regions.iter().map(|region| async move {
        let mut region = region.clone();
        if region.availability_zones.is_empty() {
            let network = lookup.network_by_name(vpc, account, &region.name).await?;
            region.availability_zones = lookup
                .availability_zones(account, &network.id, subnet, &region.name)
                .await?;
            tracing::debug!(
                region = %region.name,
                zones = ?region.availability_zones,
                "Using default availability zones"
            );
        }
        Ok::<_, AlbError>(region)
    }))
    .await?;

    let mut resolved = spec.clone();
    resolved.locations.regions = regions.into_iter().collect();
    Ok(resolved)
}
