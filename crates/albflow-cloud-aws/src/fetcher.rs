//! Current state fetching
//!
//! Reads live load balancers from every requested region concurrently and
//! translates them into [`ApplicationLoadBalancer`]s. A region without the
//! load balancer is left out of the result; any other failure fails the
//! whole fetch.

use crate::cloud::{
    ActionModel, ApplicationLoadBalancerModel, CloudStateService, ListenerModel, NetworkLookup,
    TRAFFIC_PORT, TargetGroupModel,
};
use crate::error::{AlbError, Result};
use crate::model::{
    ApplicationLoadBalancer, HealthCheck, Listener, ListenerAction, LoadBalancerDependencies,
    Location, Moniker, Rule, TargetGroup,
};
use futures_util::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// Fetches and normalizes live application load balancers
#[derive(Clone)]
pub struct CurrentStateFetcher {
    cloud_state: Arc<dyn CloudStateService>,
    lookup: Arc<dyn NetworkLookup>,
    cloud_provider: String,
}

impl CurrentStateFetcher {
    pub fn new(
        cloud_state: Arc<dyn CloudStateService>,
        lookup: Arc<dyn NetworkLookup>,
        cloud_provider: impl Into<String>,
    ) -> Self {
        Self {
            cloud_state,
            lookup,
            cloud_provider: cloud_provider.into(),
        }
    }

    /// Fetch the load balancer `name` from every region.
    ///
    /// All regions are queried concurrently. The first real error drops the
    /// remaining in-flight queries and is returned; no partial map escapes.
    pub async fn fetch(
        &self,
        account: &str,
        name: &str,
        regions: &[String],
        service_account: &str,
    ) -> Result<BTreeMap<String, ApplicationLoadBalancer>> {
        let results = try_join_all(
            regions
                .iter()
                .map(|region| self.fetch_region(account, name, region, service_account)),
        )
        .await?;

        let current: BTreeMap<_, _> = results.into_iter().flatten().collect();
        tracing::debug!(
            load_balancer = name,
            account,
            requested = regions.len(),
            found = current.len(),
            "Fetched current state"
        );
        Ok(current)
    }

    async fn fetch_region(
        &self,
        account: &str,
        name: &str,
        region: &str,
        service_account: &str,
    ) -> Result<Option<(String, ApplicationLoadBalancer)>> {
        let models = match self
            .cloud_state
            .load_balancers(service_account, &self.cloud_provider, account, region, name)
            .await
        {
            Ok(models) => models,
            Err(e) if e.is_not_found() => {
                tracing::debug!(load_balancer = name, account, region, "Load balancer not found");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match models.into_iter().next() {
            Some(model) => {
                let alb = self.translate(model, account, region).await?;
                Ok(Some((region.to_string(), alb)))
            }
            None => {
                tracing::debug!(load_balancer = name, account, region, "Load balancer not found");
                Ok(None)
            }
        }
    }

    /// Translate the provider's shape into a resolved load balancer
    pub async fn translate(
        &self,
        model: ApplicationLoadBalancerModel,
        account: &str,
        region: &str,
    ) -> Result<ApplicationLoadBalancer> {
        let name = model.load_balancer_name.clone();

        let security_group_names = try_join_all(
            model
                .security_groups
                .iter()
                .map(|id| self.lookup.security_group_name(account, region, id)),
        )
        .await?;

        let vpc = self.lookup.network_name(&model.vpc_id).await?;

        let subnet_id = model
            .subnets
            .first()
            .ok_or_else(|| AlbError::MissingSubnet(name.clone()))?;
        let subnet = self
            .lookup
            .subnet_purpose(subnet_id)
            .await?
            .ok_or_else(|| AlbError::MissingSubnet(name.clone()))?;

        let listeners =
            try_join_all(model.listeners.iter().map(|l| self.translate_listener(l))).await?;

        let target_groups = model
            .target_groups
            .iter()
            .map(|tg| translate_target_group(tg, &name, region))
            .collect::<Result<BTreeSet<_>>>()?;

        Ok(ApplicationLoadBalancer {
            moniker: Moniker::parse(&name),
            location: Location {
                account: account.to_string(),
                region: region.to_string(),
                vpc,
                subnet,
                availability_zones: model.availability_zones,
            },
            internal: model
                .scheme
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains("internal")),
            dependencies: LoadBalancerDependencies {
                security_group_names: security_group_names.into_iter().collect(),
            },
            idle_timeout: Duration::from_secs(model.idle_timeout),
            listeners: listeners.into_iter().collect(),
            target_groups,
        })
    }

    async fn translate_listener(&self, listener: &ListenerModel) -> Result<Listener> {
        let certificate = match listener.certificates.first() {
            Some(cert) => Some(self.lookup.certificate_name(&cert.certificate_arn).await?),
            None => None,
        };

        Ok(Listener {
            port: listener.port,
            protocol: listener.protocol.clone(),
            certificate,
            rules: listener
                .rules
                .iter()
                .filter(|rule| !rule.is_default)
                .map(|rule| Rule {
                    priority: rule.priority.clone(),
                    conditions: rule.conditions.iter().cloned().collect(),
                    actions: rule.actions.iter().map(translate_action).collect(),
                })
                .collect(),
            default_actions: listener.default_actions.iter().map(translate_action).collect(),
        })
    }
}

fn translate_action(action: &ActionModel) -> ListenerAction {
    ListenerAction {
        order: action.order,
        action_type: action.action_type.clone(),
        target_group_name: action.target_group_name.clone(),
        redirect_config: action.redirect_config.clone(),
    }
}

fn translate_target_group(tg: &TargetGroupModel, name: &str, region: &str) -> Result<TargetGroup> {
    let port = if tg.health_check_port == TRAFFIC_PORT {
        tg.port
    } else {
        tg.health_check_port
            .parse()
            .map_err(|_| AlbError::InvalidLiveState {
                name: name.to_string(),
                region: region.to_string(),
                message: format!(
                    "target group {} has invalid health check port '{}'",
                    tg.target_group_name, tg.health_check_port
                ),
            })?
    };

    Ok(TargetGroup {
        name: tg.target_group_name.clone(),
        target_type: tg.target_type.clone(),
        protocol: tg.protocol.clone(),
        port: tg.port,
        health_check: HealthCheck {
            enabled: tg.health_check_enabled,
            timeout: Duration::from_secs(tg.health_check_timeout_seconds),
            port,
            protocol: tg.health_check_protocol.clone(),
            http_code: tg.matcher.http_code.clone(),
            path: tg.health_check_path.clone(),
            interval: Duration::from_secs(tg.health_check_interval_seconds),
            healthy_threshold: tg.healthy_threshold_count,
            unhealthy_threshold: tg.unhealthy_threshold_count,
        },
        attributes: tg.attributes.clone(),
    })
}
