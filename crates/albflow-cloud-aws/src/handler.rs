//! Application load balancer resource handler

use crate::cloud::{CloudStateService, NetworkLookup};
use crate::error::{AlbError, Result};
use crate::export::export_spec;
use crate::fetcher::CurrentStateFetcher;
use crate::job::upsert_job;
use crate::model::{ApplicationLoadBalancer, ApplicationLoadBalancerSpec, KIND, Moniker};
use crate::resolver::{resolve_desired, with_default_zones};
use albflow_cloud::{
    Action, ActionType, ExportRequest, OrchestrationQuery, Plan, Resource, ResourceDiff,
    ResourceHandler, ResourceRef, Task, TaskLauncher, correlation_key,
};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEFAULT_CLOUD_PROVIDER: &str = "aws";
pub const DEFAULT_SERVICE_ACCOUNT: &str = "albflow";

/// Per-region desired/current diff of a load balancer
pub type RegionalDiff = ResourceDiff<BTreeMap<String, ApplicationLoadBalancer>>;

/// Handler reconciling application load balancers across regions
pub struct ApplicationLoadBalancerHandler {
    cloud_state: Arc<dyn CloudStateService>,
    fetcher: CurrentStateFetcher,
    lookup: Arc<dyn NetworkLookup>,
    launcher: Arc<dyn TaskLauncher>,
    executions: Arc<dyn OrchestrationQuery>,
    cloud_provider: String,
    service_account: String,
}

impl ApplicationLoadBalancerHandler {
    pub fn new(
        cloud_state: Arc<dyn CloudStateService>,
        lookup: Arc<dyn NetworkLookup>,
        launcher: Arc<dyn TaskLauncher>,
        executions: Arc<dyn OrchestrationQuery>,
    ) -> Self {
        Self {
            fetcher: CurrentStateFetcher::new(
                cloud_state.clone(),
                lookup.clone(),
                DEFAULT_CLOUD_PROVIDER,
            ),
            cloud_state,
            lookup,
            launcher,
            executions,
            cloud_provider: DEFAULT_CLOUD_PROVIDER.to_string(),
            service_account: DEFAULT_SERVICE_ACCOUNT.to_string(),
        }
    }

    pub fn with_cloud_provider(mut self, cloud_provider: impl Into<String>) -> Self {
        let cloud_provider = cloud_provider.into();
        self.fetcher = CurrentStateFetcher::new(
            self.cloud_state.clone(),
            self.lookup.clone(),
            cloud_provider.clone(),
        );
        self.cloud_provider = cloud_provider;
        self
    }

    pub fn with_service_account(mut self, service_account: impl Into<String>) -> Self {
        self.service_account = service_account.into();
        self
    }

    /// Wrap a spec into a resource with its derived identity
    pub fn resource(
        &self,
        spec: ApplicationLoadBalancerSpec,
    ) -> Resource<ApplicationLoadBalancerSpec> {
        let reference = ResourceRef {
            id: spec.id(),
            kind: KIND.to_string(),
            application: spec.application().to_string(),
        };
        Resource::new(reference, spec)
    }

    /// Per-region actions needed to converge the resource.
    ///
    /// Regions without changes produce no action. The action type is decided
    /// for the resource as a whole: `Create` only when no region exists yet.
    pub fn plan(
        &self,
        resource: &Resource<ApplicationLoadBalancerSpec>,
        diff: &RegionalDiff,
    ) -> Plan {
        let action_type = if diff.current_is_empty() {
            ActionType::Create
        } else {
            ActionType::Update
        };

        let mut actions = Vec::new();
        let mut unchanged = Vec::new();
        for (region, region_diff) in diff.by_key() {
            if !region_diff.has_changes() {
                unchanged.push(region);
                continue;
            }
            actions.push(Action {
                id: correlation_key(resource.id(), &region),
                action_type,
                resource_id: resource.id().to_string(),
                description: format!(
                    "{} application load balancer {} in {}/{}",
                    action_type,
                    resource.spec.moniker,
                    resource.spec.locations.account,
                    region
                ),
                changes: region_diff.changes(),
                region,
            });
        }

        Plan::new(actions, unchanged)
    }

    /// Submit one job per drifted region, concurrently.
    ///
    /// Any submission failure fails the whole call; submissions already
    /// accepted stay deduplicated by their correlation key.
    pub async fn submit(
        &self,
        resource: &Resource<ApplicationLoadBalancerSpec>,
        diff: &RegionalDiff,
    ) -> Result<Vec<Task>> {
        let plan = self.plan(resource, diff);
        if !plan.has_changes {
            tracing::debug!(resource = %resource.id(), "No drift, nothing to submit");
            return Ok(Vec::new());
        }

        let submissions = plan.actions.iter().map(|action| async move {
            let desired = diff
                .desired()
                .get(&action.region)
                .ok_or_else(|| AlbError::MissingRegion(action.region.clone()))?;
            let job = upsert_job(desired, self.lookup.as_ref(), &self.cloud_provider).await?;

            tracing::info!(
                resource = %resource.id(),
                region = %action.region,
                action = %action.action_type,
                changes = ?action.changes,
                "Submitting load balancer job"
            );
            let task = self
                .launcher
                .submit(&resource.reference, &action.description, &action.id, job)
                .await?;
            Ok::<_, AlbError>(task)
        });

        try_join_all(submissions).await
    }

    /// Whether any region of the resource has an execution in flight
    pub async fn in_progress(
        &self,
        resource: &Resource<ApplicationLoadBalancerSpec>,
    ) -> Result<bool> {
        let keys: Vec<String> = resource
            .spec
            .locations
            .regions
            .iter()
            .map(|region| correlation_key(resource.id(), &region.name))
            .collect();

        let executions = try_join_all(
            keys.iter()
                .map(|key| self.executions.executions_by_correlation(key)),
        )
        .await?;
        tracing::debug!(
            resource = %resource.id(),
            in_flight = executions.iter().filter(|e| !e.is_empty()).count(),
            "Checked in-flight executions"
        );

        Ok(executions.iter().any(|e| !e.is_empty()))
    }
}

#[async_trait]
impl ResourceHandler for ApplicationLoadBalancerHandler {
    type Spec = ApplicationLoadBalancerSpec;
    type Resolved = ApplicationLoadBalancer;
    type Moniker = Moniker;
    type Error = AlbError;

    fn kind(&self) -> &str {
        KIND
    }

    async fn resolve(
        &self,
        resource: &Resource<Self::Spec>,
    ) -> Result<BTreeMap<String, Self::Resolved>> {
        resource.spec.moniker.validate()?;
        let spec = with_default_zones(&resource.spec, self.lookup.as_ref()).await?;
        resolve_desired(&spec)
    }

    async fn current(
        &self,
        resource: &Resource<Self::Spec>,
    ) -> Result<BTreeMap<String, Self::Resolved>> {
        let spec = &resource.spec;
        spec.moniker.validate()?;
        self.fetcher
            .fetch(
                &spec.locations.account,
                &spec.moniker.name(),
                &spec.locations.region_names(),
                &self.service_account,
            )
            .await
    }

    async fn upsert(
        &self,
        resource: &Resource<Self::Spec>,
        diff: &RegionalDiff,
    ) -> Result<Vec<Task>> {
        self.submit(resource, diff).await
    }

    async fn export(&self, request: &ExportRequest<Self::Moniker>) -> Result<Self::Spec> {
        export_spec(&self.fetcher, self.lookup.as_ref(), request).await
    }

    async fn actuation_in_progress(&self, resource: &Resource<Self::Spec>) -> Result<bool> {
        self.in_progress(resource).await
    }
}
