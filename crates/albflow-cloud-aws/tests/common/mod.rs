use albflow_cloud::{
    CloudError, ExecutionSummary, Job, OrchestrationQuery, ResourceRef, Task, TaskLauncher,
};
use albflow_cloud_aws::cloud::{ActionModel, ListenerModel, Matcher, TargetGroupModel};
use albflow_cloud_aws::{
    ApplicationLoadBalancerHandler, ApplicationLoadBalancerModel, ApplicationLoadBalancerSpec,
    Certificate, CloudStateService, HealthCheck, Listener, ListenerAction,
    LoadBalancerDependencies, Moniker, Network, NetworkLookup, SubnetAwareLocations,
    SubnetAwareRegionSpec, TargetGroup,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ACCOUNT: &str = "test";
pub const NAME: &str = "fnord-test";
pub const RESOURCE_ID: &str = "ec2:application-load-balancer:test:fnord-test";

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Submission {
    pub resource: ResourceRef,
    pub description: String,
    pub correlation_key: String,
    pub job: Job,
}

/// In-memory cloud: live load balancers per region plus a fixed network inventory
#[derive(Default)]
pub struct FakeCloud {
    pub live: Mutex<BTreeMap<String, ApplicationLoadBalancerModel>>,
    pub failing_regions: Mutex<BTreeSet<String>>,
    pub submissions: Mutex<Vec<Submission>>,
    pub reject_submissions: Mutex<bool>,
    pub in_flight: Mutex<BTreeSet<String>>,
}

#[allow(dead_code)]
impl FakeCloud {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_live(self: Arc<Self>, region: &str, model: ApplicationLoadBalancerModel) -> Arc<Self> {
        self.live.lock().unwrap().insert(region.to_string(), model);
        self
    }

    pub fn failing(self: Arc<Self>, region: &str) -> Arc<Self> {
        self.failing_regions.lock().unwrap().insert(region.to_string());
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn handler(self: &Arc<Self>) -> ApplicationLoadBalancerHandler {
        ApplicationLoadBalancerHandler::new(
            self.clone(),
            self.clone(),
            self.clone(),
            self.clone(),
        )
        .with_service_account("albflow@example.com")
    }
}

pub fn default_zones(region: &str) -> BTreeSet<String> {
    ["a", "b", "c"]
        .iter()
        .map(|z| format!("{}{}", region, z))
        .collect()
}

pub fn certificate_arn(name: &str) -> String {
    format!("arn:aws:iam::123456789012:server-certificate/{}", name)
}

#[async_trait]
impl CloudStateService for FakeCloud {
    async fn load_balancers(
        &self,
        _service_account: &str,
        _provider: &str,
        account: &str,
        region: &str,
        name: &str,
    ) -> albflow_cloud::Result<Vec<ApplicationLoadBalancerModel>> {
        if self.failing_regions.lock().unwrap().contains(region) {
            return Err(CloudError::ApiError(format!("503 from {}", region)));
        }
        match self.live.lock().unwrap().get(region) {
            Some(model) if account == ACCOUNT && model.load_balancer_name == name => {
                Ok(vec![model.clone()])
            }
            _ => Err(CloudError::ResourceNotFound(format!("{} in {}", name, region))),
        }
    }
}

#[async_trait]
impl NetworkLookup for FakeCloud {
    async fn security_group_name(
        &self,
        _account: &str,
        _region: &str,
        id: &str,
    ) -> albflow_cloud::Result<String> {
        id.strip_prefix("sg-")
            .map(str::to_string)
            .ok_or_else(|| CloudError::LookupFailed(id.to_string()))
    }

    async fn network_name(&self, id: &str) -> albflow_cloud::Result<String> {
        match id {
            "vpc-1" => Ok("vpc0".to_string()),
            _ => Err(CloudError::LookupFailed(id.to_string())),
        }
    }

    async fn network_by_name(
        &self,
        name: &str,
        account: &str,
        region: &str,
    ) -> albflow_cloud::Result<Network> {
        Ok(Network {
            id: "vpc-1".to_string(),
            name: name.to_string(),
            account: account.to_string(),
            region: region.to_string(),
        })
    }

    async fn subnet_purpose(&self, _id: &str) -> albflow_cloud::Result<Option<String>> {
        Ok(Some("internal (vpc0)".to_string()))
    }

    async fn certificate_name(&self, arn: &str) -> albflow_cloud::Result<String> {
        arn.rsplit('/')
            .next()
            .map(str::to_string)
            .ok_or_else(|| CloudError::LookupFailed(arn.to_string()))
    }

    async fn certificate_by_name(
        &self,
        account: &str,
        name: &str,
    ) -> albflow_cloud::Result<Certificate> {
        Ok(Certificate {
            account: account.to_string(),
            arn: certificate_arn(name),
            server_certificate_name: name.to_string(),
        })
    }

    async fn availability_zones(
        &self,
        _account: &str,
        _vpc_id: &str,
        _purpose: &str,
        region: &str,
    ) -> albflow_cloud::Result<BTreeSet<String>> {
        Ok(default_zones(region))
    }
}

#[async_trait]
impl TaskLauncher for FakeCloud {
    async fn submit(
        &self,
        resource: &ResourceRef,
        description: &str,
        correlation_key: &str,
        job: Job,
    ) -> albflow_cloud::Result<Task> {
        if *self.reject_submissions.lock().unwrap() {
            return Err(CloudError::SubmissionFailed("launcher unavailable".to_string()));
        }
        self.submissions.lock().unwrap().push(Submission {
            resource: resource.clone(),
            description: description.to_string(),
            correlation_key: correlation_key.to_string(),
            job,
        });
        Ok(Task {
            id: format!("task-{}", correlation_key),
            name: description.to_string(),
        })
    }
}

#[async_trait]
impl OrchestrationQuery for FakeCloud {
    async fn executions_by_correlation(
        &self,
        key: &str,
    ) -> albflow_cloud::Result<Vec<ExecutionSummary>> {
        if self.in_flight.lock().unwrap().contains(key) {
            Ok(vec![ExecutionSummary {
                id: format!("exec-{}", key),
                name: "Upsert".to_string(),
                started_at: Utc::now(),
            }])
        } else {
            Ok(Vec::new())
        }
    }
}

pub fn target_group(port: u16) -> TargetGroup {
    TargetGroup {
        name: "fnord-tg".to_string(),
        target_type: "instance".to_string(),
        protocol: "HTTP".to_string(),
        port,
        health_check: HealthCheck::default(),
        attributes: BTreeMap::new(),
    }
}

pub fn listener() -> Listener {
    Listener {
        port: 80,
        protocol: "HTTP".to_string(),
        certificate: None,
        rules: BTreeSet::new(),
        default_actions: [ListenerAction::forward(1, "fnord-tg")].into_iter().collect(),
    }
}

/// Spec matching [`live_model`] with a target group on port 80
pub fn spec(regions: &[&str]) -> ApplicationLoadBalancerSpec {
    ApplicationLoadBalancerSpec {
        moniker: Moniker::new("fnord").with_stack("test"),
        locations: SubnetAwareLocations {
            account: ACCOUNT.to_string(),
            vpc: Some("vpc0".to_string()),
            subnet: Some("internal (vpc0)".to_string()),
            regions: regions
                .iter()
                .map(|r| SubnetAwareRegionSpec::new(*r))
                .collect(),
        },
        internal: true,
        dependencies: LoadBalancerDependencies::security_groups(["fnord"]),
        idle_timeout: Duration::from_secs(60),
        listeners: [listener()].into_iter().collect(),
        target_groups: [target_group(80)].into_iter().collect(),
        overrides: BTreeMap::new(),
    }
}

/// Live load balancer in the provider's shape, spanning every default zone
pub fn live_model(region: &str, target_group_port: u16) -> ApplicationLoadBalancerModel {
    let hc = HealthCheck::default();
    ApplicationLoadBalancerModel {
        load_balancer_name: NAME.to_string(),
        availability_zones: default_zones(region),
        vpc_id: "vpc-1".to_string(),
        subnets: vec![format!("subnet-{}", region)],
        scheme: Some("internal".to_string()),
        idle_timeout: 60,
        security_groups: ["sg-fnord".to_string()].into_iter().collect(),
        listeners: vec![ListenerModel {
            port: 80,
            protocol: "HTTP".to_string(),
            certificates: vec![],
            default_actions: vec![ActionModel {
                action_type: "forward".to_string(),
                order: 1,
                target_group_name: Some("fnord-tg".to_string()),
                redirect_config: None,
            }],
            rules: vec![],
        }],
        target_groups: vec![TargetGroupModel {
            target_group_name: "fnord-tg".to_string(),
            target_type: "instance".to_string(),
            protocol: "HTTP".to_string(),
            port: target_group_port,
            health_check_enabled: hc.enabled,
            health_check_timeout_seconds: hc.timeout.as_secs(),
            health_check_port: hc.port.to_string(),
            health_check_protocol: hc.protocol.clone(),
            health_check_path: hc.path.clone(),
            health_check_interval_seconds: hc.interval.as_secs(),
            healthy_threshold_count: hc.healthy_threshold,
            unhealthy_threshold_count: hc.unhealthy_threshold,
            matcher: Matcher {
                http_code: hc.http_code.clone(),
            },
            attributes: BTreeMap::new(),
        }],
    }
}
