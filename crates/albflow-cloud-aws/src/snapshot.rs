//! Snapshot-backed cloud state
//!
//! Serves every collaborator of the handler from a `.albflow/snapshot.json`
//! file: live load balancers, the network inventory used for lookups, and
//! the executions submitted through it.

use crate::cloud::{
    ApplicationLoadBalancerModel, Certificate, CloudStateService, Network, NetworkLookup,
};
use albflow_cloud::{
    CloudError, ExecutionSummary, Job, OrchestrationQuery, ResourceRef, Result, Task, TaskLauncher,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

const SNAPSHOT_VERSION: u32 = 1;
const SNAPSHOT_FILE: &str = "snapshot.json";
const SNAPSHOT_BACKUP: &str = "snapshot.json.backup";

/// Everything known about the cloud at the time of the snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSnapshot {
    /// Snapshot file version
    pub version: u32,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub load_balancers: Vec<LiveLoadBalancer>,

    #[serde(default)]
    pub security_groups: Vec<SecurityGroupRecord>,

    #[serde(default)]
    pub networks: Vec<Network>,

    #[serde(default)]
    pub subnets: Vec<SubnetRecord>,

    #[serde(default)]
    pub certificates: Vec<Certificate>,

    /// Submitted executions indexed by correlation key
    #[serde(default)]
    pub executions: BTreeMap<String, ExecutionRecord>,
}

impl Default for CloudSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            updated_at: Utc::now(),
            load_balancers: Vec::new(),
            security_groups: Vec::new(),
            networks: Vec::new(),
            subnets: Vec::new(),
            certificates: Vec::new(),
            executions: BTreeMap::new(),
        }
    }
}

impl CloudSnapshot {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveLoadBalancer {
    pub account: String,
    pub region: String,
    pub model: ApplicationLoadBalancerModel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityGroupRecord {
    pub account: String,
    pub region: String,
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubnetRecord {
    pub id: String,
    pub account: String,
    pub region: String,
    pub vpc_id: String,
    pub availability_zone: String,
    #[serde(default)]
    pub purpose: Option<String>,
}

/// A job accepted by the snapshot's task launcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub task: Task,
    pub resource: ResourceRef,
    pub job: Job,
    pub started_at: DateTime<Utc>,
    /// Set once the execution has finished; until then it is in flight
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Reads and writes snapshot files
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Get the snapshot file path
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_BACKUP)
    }

    /// Load the snapshot, or an empty one if the file does not exist yet
    pub async fn load(&self) -> Result<CloudSnapshot> {
        let path = self.snapshot_path();
        if !path.exists() {
            tracing::debug!("Snapshot file not found, returning empty snapshot");
            return Ok(CloudSnapshot::new());
        }

        let content = fs::read_to_string(&path).await?;
        let snapshot: CloudSnapshot = serde_json::from_str(&content)?;

        if snapshot.version > SNAPSHOT_VERSION {
            return Err(CloudError::StateError(format!(
                "Snapshot file version {} is newer than supported version {}",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        tracing::debug!(
            load_balancers = snapshot.load_balancers.len(),
            executions = snapshot.executions.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Save the snapshot, keeping the previous file as a backup
    pub async fn save(&self, snapshot: &CloudSnapshot) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
            tracing::debug!("Created snapshot directory: {}", self.dir.display());
        }

        let path = self.snapshot_path();
        let backup = self.backup_path();

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
        }

        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved snapshot to {}", path.display());
        Ok(())
    }
}

/// Serves the handler's collaborators from a loaded snapshot
pub struct SnapshotBackend {
    store: SnapshotStore,
    snapshot: RwLock<CloudSnapshot>,
}

impl SnapshotBackend {
    pub async fn open(store: SnapshotStore) -> Result<Self> {
        let snapshot = store.load().await?;
        Ok(Self::with_snapshot(store, snapshot))
    }

    pub fn with_snapshot(store: SnapshotStore, snapshot: CloudSnapshot) -> Self {
        Self {
            store,
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Copy of the current snapshot contents
    pub async fn snapshot(&self) -> CloudSnapshot {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl CloudStateService for SnapshotBackend {
    async fn load_balancers(
        &self,
        service_account: &str,
        provider: &str,
        account: &str,
        region: &str,
        name: &str,
    ) -> Result<Vec<ApplicationLoadBalancerModel>> {
        tracing::debug!(
            service_account,
            provider,
            account,
            region,
            load_balancer = name,
            "Reading snapshot"
        );
        let snapshot = self.snapshot.read().await;
        let found: Vec<_> = snapshot
            .load_balancers
            .iter()
            .filter(|lb| {
                lb.account == account && lb.region == region && lb.model.load_balancer_name == name
            })
            .map(|lb| lb.model.clone())
            .collect();

        if found.is_empty() {
            return Err(CloudError::ResourceNotFound(format!(
                "{} in {}/{}",
                name, account, region
            )));
        }
        Ok(found)
    }
}

#[async_trait]
impl NetworkLookup for SnapshotBackend {
    async fn security_group_name(&self, account: &str, region: &str, id: &str) -> Result<String> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .security_groups
            .iter()
            .find(|sg| sg.account == account && sg.region == region && sg.id == id)
            .map(|sg| sg.name.clone())
            .ok_or_else(|| CloudError::LookupFailed(format!("security group {} in {}", id, region)))
    }

    async fn network_name(&self, id: &str) -> Result<String> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .networks
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.name.clone())
            .ok_or_else(|| CloudError::LookupFailed(format!("network {}", id)))
    }

    async fn network_by_name(&self, name: &str, account: &str, region: &str) -> Result<Network> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .networks
            .iter()
            .find(|n| n.name == name && n.account == account && n.region == region)
            .cloned()
            .ok_or_else(|| {
                CloudError::LookupFailed(format!("network {} in {}/{}", name, account, region))
            })
    }

    async fn subnet_purpose(&self, id: &str) -> Result<Option<String>> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .subnets
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.purpose.clone())
            .ok_or_else(|| CloudError::LookupFailed(format!("subnet {}", id)))
    }

    async fn certificate_name(&self, arn: &str) -> Result<String> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .certificates
            .iter()
            .find(|c| c.arn == arn)
            .map(|c| c.server_certificate_name.clone())
            .ok_or_else(|| CloudError::LookupFailed(format!("certificate {}", arn)))
    }

    async fn certificate_by_name(&self, account: &str, name: &str) -> Result<Certificate> {
        let snapshot = self.snapshot.read().await;
        snapshot
            .certificates
            .iter()
            .find(|c| c.account == account && c.server_certificate_name == name)
            .cloned()
            .ok_or_else(|| CloudError::LookupFailed(format!("certificate {} in {}", name, account)))
    }

    async fn availability_zones(
        &self,
        account: &str,
        vpc_id: &str,
        purpose: &str,
        region: &str,
    ) -> Result<BTreeSet<String>> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .subnets
            .iter()
            .filter(|s| {
                s.account == account
                    && s.vpc_id == vpc_id
                    && s.region == region
                    && s.purpose.as_deref() == Some(purpose)
            })
            .map(|s| s.availability_zone.clone())
            .collect())
    }
}

#[async_trait]
impl TaskLauncher for SnapshotBackend {
    async fn submit(
        &self,
        resource: &ResourceRef,
        description: &str,
        correlation_key: &str,
        job: Job,
    ) -> Result<Task> {
        let mut snapshot = self.snapshot.write().await;

        if let Some(existing) = snapshot.executions.get(correlation_key) {
            if existing.completed_at.is_none() {
                tracing::info!(
                    correlation_key,
                    task = %existing.task.id,
                    "Execution already in flight, not submitting again"
                );
                return Ok(existing.task.clone());
            }
        }

        let started_at = Utc::now();
        let task = Task {
            id: format!(
                "{}-{}",
                started_at.timestamp_millis(),
                snapshot.executions.len() + 1
            ),
            name: description.to_string(),
        };
        // Only a persisted execution counts as in flight
        let mut next = snapshot.clone();
        next.executions.insert(
            correlation_key.to_string(),
            ExecutionRecord {
                task: task.clone(),
                resource: resource.clone(),
                job,
                started_at,
                completed_at: None,
            },
        );
        next.updated_at = started_at;

        self.store.save(&next).await?;
        *snapshot = next;
        tracing::info!(correlation_key, task = %task.id, "Submitted task");
        Ok(task)
    }
}

#[async_trait]
impl OrchestrationQuery for SnapshotBackend {
    async fn executions_by_correlation(&self, key: &str) -> Result<Vec<ExecutionSummary>> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .executions
            .get(key)
            .filter(|e| e.completed_at.is_none())
            .map(|e| ExecutionSummary {
                id: e.task.id.clone(),
                name: e.task.name.clone(),
                started_at: e.started_at,
            })
            .into_iter()
            .collect())
    }
}
