//! Cloud-state and lookup collaborators
//!
//! Live load balancers arrive in the provider's own shape
//! ([`ApplicationLoadBalancerModel`]); IDs inside it are resolved to names
//! through [`NetworkLookup`].

use albflow_cloud::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{RedirectConfig, RuleCondition};

/// Health check port value meaning "same port as the target group"
pub const TRAFFIC_PORT: &str = "traffic-port";

/// Read access to live cloud state.
///
/// A load balancer that does not exist in a region is reported either as an
/// empty list or as `CloudError::ResourceNotFound`; every other error is a
/// real failure.
#[async_trait]
pub trait CloudStateService: Send + Sync {
    async fn load_balancers(
        &self,
        service_account: &str,
        provider: &str,
        account: &str,
        region: &str,
        name: &str,
    ) -> Result<Vec<ApplicationLoadBalancerModel>>;
}

/// Read-only ID/name resolution for network resources.
///
/// Implementations may cache internally.
#[async_trait]
pub trait NetworkLookup: Send + Sync {
    async fn security_group_name(&self, account: &str, region: &str, id: &str) -> Result<String>;

    async fn network_name(&self, id: &str) -> Result<String>;

    async fn network_by_name(&self, name: &str, account: &str, region: &str) -> Result<Network>;

    /// Purpose tag of a subnet, if it has one
    async fn subnet_purpose(&self, id: &str) -> Result<Option<String>>;

    async fn certificate_name(&self, arn: &str) -> Result<String>;

    async fn certificate_by_name(&self, account: &str, name: &str) -> Result<Certificate>;

    /// Every availability zone spanned by the subnets with `purpose` in the VPC
    async fn availability_zones(
        &self,
        account: &str,
        vpc_id: &str,
        purpose: &str,
        region: &str,
    ) -> Result<BTreeSet<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub id: String,
    pub name: String,
    pub account: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub account: String,
    pub arn: String,
    pub server_certificate_name: String,
}

/// Live application load balancer as reported by the cloud-state service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationLoadBalancerModel {
    pub load_balancer_name: String,

    #[serde(default)]
    pub availability_zones: BTreeSet<String>,

    pub vpc_id: String,

    #[serde(default)]
    pub subnets: Vec<String>,

    #[serde(default)]
    pub scheme: Option<String>,

    /// Seconds
    pub idle_timeout: u64,

    /// Security group IDs
    #[serde(default)]
    pub security_groups: BTreeSet<String>,

    #[serde(default)]
    pub listeners: Vec<ListenerModel>,

    #[serde(default)]
    pub target_groups: Vec<TargetGroupModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerModel {
    pub port: u16,

    pub protocol: String,

    #[serde(default)]
    pub certificates: Vec<CertificateModel>,

    #[serde(default)]
    pub default_actions: Vec<ActionModel>,

    #[serde(default)]
    pub rules: Vec<RuleModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateModel {
    pub certificate_arn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionModel {
    #[serde(rename = "type")]
    pub action_type: String,

    #[serde(default)]
    pub order: i32,

    #[serde(default)]
    pub target_group_name: Option<String>,

    #[serde(default)]
    pub redirect_config: Option<RedirectConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleModel {
    pub priority: String,

    #[serde(default)]
    pub conditions: Vec<RuleCondition>,

    #[serde(default)]
    pub actions: Vec<ActionModel>,

    /// The listener's catch-all rule
    #[serde(default, rename = "default")]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetGroupModel {
    pub target_group_name: String,

    pub target_type: String,

    pub protocol: String,

    pub port: u16,

    pub health_check_enabled: bool,

    pub health_check_timeout_seconds: u64,

    /// Port number or [`TRAFFIC_PORT`]
    pub health_check_port: String,

    pub health_check_protocol: String,

    pub health_check_path: String,

    pub health_check_interval_seconds: u64,

    pub healthy_threshold_count: u32,

    pub unhealthy_threshold_count: u32,

    pub matcher: Matcher,

    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    pub http_code: String,
}
