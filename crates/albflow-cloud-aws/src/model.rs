//! Application load balancer model
//!
//! The declarative spec (with per-region overrides) and the fully resolved
//! per-region object that both desired and current state are expressed in.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Resource kind handled by this crate
pub const KIND: &str = "ec2/application-load-balancer@v1";

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Durations travel as integer seconds
pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Application/stack/detail naming triple
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Moniker {
    pub app: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Moniker {
    pub fn new(app: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            stack: None,
            detail: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Parse a resource name like `app-stack-detail`.
    ///
    /// Only the first two dashes separate components; the detail may contain
    /// further dashes.
    pub fn parse(name: &str) -> Self {
        let mut parts = name.splitn(3, '-');
        let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_string);
        Self {
            app: parts.next().unwrap_or_default().to_string(),
            stack: non_empty(parts.next()),
            detail: non_empty(parts.next()),
        }
    }

    /// Reject monikers whose name would not parse back into the same moniker.
    ///
    /// Live state only carries the resource name, so `app` and `stack` must
    /// not contain dashes.
    pub fn validate(&self) -> crate::error::Result<()> {
        let dashed = |part: &str| part.is_empty() || part.contains('-');
        if dashed(&self.app) || self.stack.as_deref().is_some_and(dashed) {
            return Err(crate::error::AlbError::InvalidMoniker(self.name()));
        }
        Ok(())
    }

    /// Resource name derived from the moniker
    pub fn name(&self) -> String {
        match (&self.stack, &self.detail) {
            (None, None) => self.app.clone(),
            (Some(stack), None) => format!("{}-{}", self.app, stack),
            (None, Some(detail)) => format!("{}--{}", self.app, detail),
            (Some(stack), Some(detail)) => format!("{}-{}-{}", self.app, stack, detail),
        }
    }
}

impl std::fmt::Display for Moniker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Account, network and regions a load balancer is deployed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetAwareLocations {
    pub account: String,

    /// VPC name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc: Option<String>,

    /// Subnet purpose
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,

    pub regions: BTreeSet<SubnetAwareRegionSpec>,
}

impl SubnetAwareLocations {
    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.name.clone()).collect()
    }
}

/// A region plus the availability zones used in it.
///
/// An empty zone set means "use every zone the subnet spans".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetAwareRegionSpec {
    pub name: String,

    #[serde(default)]
    pub availability_zones: BTreeSet<String>,
}

impl SubnetAwareRegionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            availability_zones: BTreeSet::new(),
        }
    }

    pub fn with_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.availability_zones = zones.into_iter().map(Into::into).collect();
        self
    }
}

/// Resources the load balancer depends on
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerDependencies {
    #[serde(default)]
    pub security_group_names: BTreeSet<String>,
}

impl LoadBalancerDependencies {
    pub fn security_groups<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            security_group_names: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// Listener of an application load balancer.
///
/// Only explicit rules are tracked; the catch-all default rule is implied by
/// `default_actions`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    pub port: u16,

    pub protocol: String,

    /// Server certificate name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,

    #[serde(default)]
    pub rules: BTreeSet<Rule>,

    pub default_actions: BTreeSet<ListenerAction>,
}

/// Explicit listener rule
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub priority: String,

    #[serde(default)]
    pub conditions: BTreeSet<RuleCondition>,

    pub actions: BTreeSet<ListenerAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub field: String,
    pub values: BTreeSet<String>,
}

/// Listener or rule action; sets of actions sort by `order` first
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerAction {
    pub order: i32,

    #[serde(rename = "type")]
    pub action_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_group_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_config: Option<RedirectConfig>,
}

impl ListenerAction {
    pub fn forward(order: i32, target_group_name: impl Into<String>) -> Self {
        Self {
            order,
            action_type: "forward".to_string(),
            target_group_name: Some(target_group_name.into()),
            redirect_config: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectConfig {
    pub protocol: String,
    pub port: Option<String>,
    pub host: String,
    pub path: String,
    pub query: Option<String>,
    pub status_code: String,
}

/// Named pool of backends with its health check
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroup {
    pub name: String,

    #[serde(default = "default_target_type")]
    pub target_type: String,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    pub port: u16,

    #[serde(default)]
    pub health_check: HealthCheck,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

fn default_target_type() -> String {
    "instance".to_string()
}

fn default_protocol() -> String {
    "HTTP".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HealthCheck {
    pub enabled: bool,

    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Concrete port; the `traffic-port` sentinel is resolved when reading live state
    pub port: u16,

    pub protocol: String,

    pub http_code: String,

    pub path: String,

    #[serde(with = "duration_secs")]
    pub interval: Duration,

    pub healthy_threshold: u32,

    pub unhealthy_threshold: u32,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_secs(5),
            port: 7001,
            protocol: "HTTP".to_string(),
            http_code: "200-299".to_string(),
            path: "/healthcheck".to_string(),
            interval: Duration::from_secs(10),
            healthy_threshold: 10,
            unhealthy_threshold: 2,
        }
    }
}

/// Per-region replacement of the overridable spec fields.
///
/// An absent field means "use the spec default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationLoadBalancerOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<LoadBalancerDependencies>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listeners: Option<BTreeSet<Listener>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_groups: Option<BTreeSet<TargetGroup>>,
}

impl ApplicationLoadBalancerOverride {
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_none() && self.listeners.is_none() && self.target_groups.is_none()
    }
}

/// Declarative spec of an application load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationLoadBalancerSpec {
    pub moniker: Moniker,

    pub locations: SubnetAwareLocations,

    #[serde(default = "default_internal")]
    pub internal: bool,

    #[serde(default)]
    pub dependencies: LoadBalancerDependencies,

    #[serde(default = "default_idle_timeout", with = "duration_secs")]
    pub idle_timeout: Duration,

    pub listeners: BTreeSet<Listener>,

    pub target_groups: BTreeSet<TargetGroup>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, ApplicationLoadBalancerOverride>,
}

fn default_internal() -> bool {
    true
}

fn default_idle_timeout() -> Duration {
    DEFAULT_IDLE_TIMEOUT
}

impl ApplicationLoadBalancerSpec {
    /// Unique resource id, e.g. `ec2:application-load-balancer:prod:fnord-api`
    pub fn id(&self) -> String {
        format!(
            "ec2:application-load-balancer:{}:{}",
            self.locations.account,
            self.moniker.name()
        )
    }

    pub fn application(&self) -> &str {
        &self.moniker.app
    }
}

/// Where a resolved load balancer lives; VPC and subnet are always known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub account: String,
    pub region: String,
    pub vpc: String,
    pub subnet: String,
    pub availability_zones: BTreeSet<String>,
}

/// A load balancer fully resolved for one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationLoadBalancer {
    pub moniker: Moniker,

    pub location: Location,

    pub internal: bool,

    pub dependencies: LoadBalancerDependencies,

    #[serde(with = "duration_secs")]
    pub idle_timeout: Duration,

    pub listeners: BTreeSet<Listener>,

    pub target_groups: BTreeSet<TargetGroup>,
}

impl ApplicationLoadBalancer {
    pub fn name(&self) -> String {
        self.moniker.name()
    }
}
