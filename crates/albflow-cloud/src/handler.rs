//! Resource handler trait definition

use crate::action::{Job, Task};
use crate::diff::ResourceDiff;
use crate::error::{CloudError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity of a managed resource, as seen by the orchestration engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Unique resource identifier (e.g. `ec2:application-load-balancer:prod:fnord`)
    pub id: String,

    /// Resource kind (e.g. `ec2/application-load-balancer@v1`)
    pub kind: String,

    /// Application owning the resource
    pub application: String,
}

/// A managed resource: its identity plus its declarative spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource<S> {
    #[serde(flatten)]
    pub reference: ResourceRef,

    pub spec: S,
}

impl<S> Resource<S> {
    pub fn new(reference: ResourceRef, spec: S) -> Self {
        Self { reference, spec }
    }

    pub fn id(&self) -> &str {
        &self.reference.id
    }

    pub fn application(&self) -> &str {
        &self.reference.application
    }
}

/// Parameters for turning live state back into a spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest<M> {
    /// Account the resource lives in
    pub account: String,

    /// Naming identity of the resource
    pub moniker: M,

    /// Regions to inspect
    pub regions: Vec<String>,

    /// Identity used to read cloud state
    pub service_account: String,
}

/// Contract every resource-type handler implements.
///
/// Resolved state is keyed by region; a region missing from the current
/// state means the resource does not exist there.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Declarative spec type
    type Spec: Send + Sync;

    /// Fully resolved per-region state
    type Resolved: Serialize + PartialEq + Clone + Send + Sync;

    /// Naming identity used by exports
    type Moniker: Send + Sync;

    /// Handler specific failure, able to carry collaborator errors
    type Error: std::error::Error + From<CloudError> + Send + Sync + 'static;

    /// Resource kind handled (e.g. `ec2/application-load-balancer@v1`)
    fn kind(&self) -> &str;

    /// Expand the spec into desired state per region
    async fn resolve(
        &self,
        resource: &Resource<Self::Spec>,
    ) -> std::result::Result<BTreeMap<String, Self::Resolved>, Self::Error>;

    /// Fetch live state per region
    async fn current(
        &self,
        resource: &Resource<Self::Spec>,
    ) -> std::result::Result<BTreeMap<String, Self::Resolved>, Self::Error>;

    /// Submit corrective jobs for every region that drifted
    async fn upsert(
        &self,
        resource: &Resource<Self::Spec>,
        diff: &ResourceDiff<BTreeMap<String, Self::Resolved>>,
    ) -> std::result::Result<Vec<Task>, Self::Error>;

    /// Convert live state into a normalized spec
    async fn export(
        &self,
        request: &ExportRequest<Self::Moniker>,
    ) -> std::result::Result<Self::Spec, Self::Error>;

    /// Whether any region has an orchestration execution in flight
    async fn actuation_in_progress(
        &self,
        resource: &Resource<Self::Spec>,
    ) -> std::result::Result<bool, Self::Error>;
}

/// Submits jobs to the orchestration engine.
///
/// Implementations must be idempotent per correlation key: submitting the same
/// key twice yields the task of the first submission.
#[async_trait]
pub trait TaskLauncher: Send + Sync {
    async fn submit(
        &self,
        resource: &ResourceRef,
        description: &str,
        correlation_key: &str,
        job: Job,
    ) -> Result<Task>;
}

/// Summary of an orchestration execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub id: String,
    pub name: String,
    pub started_at: DateTime<Utc>,
}

/// Read-only view of in-flight orchestration executions
#[async_trait]
pub trait OrchestrationQuery: Send + Sync {
    /// Executions still running for a correlation key. Empty means none.
    async fn executions_by_correlation(&self, key: &str) -> Result<Vec<ExecutionSummary>>;
}
