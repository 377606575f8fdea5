//! `upsertLoadBalancer` job construction

use crate::cloud::NetworkLookup;
use crate::error::Result;
use crate::model::{ApplicationLoadBalancer, Listener, TargetGroup};
use albflow_cloud::Job;
use futures_util::future::try_join_all;
use serde_json::{Value, json};

/// Orchestration operation that creates or updates a load balancer
pub const UPSERT_LOAD_BALANCER: &str = "upsertLoadBalancer";

const LOAD_BALANCER_TYPE: &str = "application";

/// Build the job converging one region to `alb`.
///
/// The VPC name and certificate names are resolved back to the IDs the
/// orchestration engine works with.
pub async fn upsert_job(
    alb: &ApplicationLoadBalancer,
    lookup: &dyn NetworkLookup,
    cloud_provider: &str,
) -> Result<Job> {
    let location = &alb.location;
    let network = lookup
        .network_by_name(&location.vpc, &location.account, &location.region)
        .await?;

    let listeners =
        try_join_all(alb.listeners.iter().map(|l| listener_payload(l, alb, lookup))).await?;

    let mut availability_zones = serde_json::Map::new();
    availability_zones.insert(
        location.region.clone(),
        json!(location.availability_zones),
    );

    let target_groups = alb
        .target_groups
        .iter()
        .map(target_group_payload)
        .collect::<Result<Vec<_>>>()?;

    Ok(Job::new(UPSERT_LOAD_BALANCER)
        .with("application", json!(alb.moniker.app))
        .with("credentials", json!(location.account))
        .with("cloudProvider", json!(cloud_provider))
        .with("name", json!(alb.name()))
        .with("region", json!(location.region))
        .with("availabilityZones", Value::Object(availability_zones))
        .with("loadBalancerType", json!(LOAD_BALANCER_TYPE))
        .with("vpcId", json!(network.id))
        .with("subnetType", json!(location.subnet))
        .with("isInternal", json!(alb.internal))
        .with("idleTimeout", json!(alb.idle_timeout.as_secs()))
        .with(
            "securityGroups",
            json!(alb.dependencies.security_group_names),
        )
        .with("listeners", Value::Array(listeners))
        .with("targetGroups", Value::Array(target_groups)))
}

async fn listener_payload(
    listener: &Listener,
    alb: &ApplicationLoadBalancer,
    lookup: &dyn NetworkLookup,
) -> Result<Value> {
    let mut default_actions: Vec<_> = listener.default_actions.iter().collect();
    default_actions.sort_by_key(|a| a.order);

    let mut payload = json!({
        "port": listener.port,
        "protocol": listener.protocol,
        "rules": serde_json::to_value(&listener.rules)?,
        "defaultActions": serde_json::to_value(&default_actions)?,
    });

    if let Some(name) = &listener.certificate {
        let certificate = lookup
            .certificate_by_name(&alb.location.account, name)
            .await?;
        payload["certificates"] = json!([{ "certificateArn": certificate.arn }]);
    }

    Ok(payload)
}

fn target_group_payload(tg: &TargetGroup) -> Result<Value> {
    let hc = &tg.health_check;
    Ok(json!({
        "name": tg.name,
        "targetType": tg.target_type,
        "protocol": tg.protocol,
        "port": tg.port,
        "healthCheckEnabled": hc.enabled,
        "healthCheckTimeout": hc.timeout.as_secs(),
        "healthCheckPort": hc.port,
        "healthCheckProtocol": hc.protocol,
        "healthCheckHttpCode": hc.http_code,
        "healthCheckPath": hc.path,
        "healthCheckInterval": hc.interval.as_secs(),
        "healthyThreshold": hc.healthy_threshold,
        "unhealthyThreshold": hc.unhealthy_threshold,
        "attributes": serde_json::to_value(&tg.attributes)?,
    }))
}
