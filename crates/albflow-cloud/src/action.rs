//! Action, job and task types for resource reconciliation

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Builds the correlation key tying a submission to one region of a resource.
///
/// The key is stable across processes, so the task launcher can use it to
/// deduplicate submissions and the orchestration query can use it to find
/// in-flight executions.
pub fn correlation_key(resource_id: &str, region: &str) -> String {
    format!("{}:{}", resource_id, region)
}

/// Represents a planned corrective action for one region of a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Correlation key of the action (`<resourceId>:<region>`)
    pub id: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Resource identifier
    pub resource_id: String,

    /// Region the action targets
    pub region: String,

    /// Description of the action
    pub description: String,

    /// Field paths that differ between desired and current state
    pub changes: Vec<String>,
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Update an existing resource
    Update,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "Create"),
            ActionType::Update => write!(f, "Update"),
        }
    }
}

/// Plan containing the actions needed to converge a resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Actions for regions that drifted
    pub actions: Vec<Action>,

    /// Regions whose current state already matches
    pub unchanged: Vec<String>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>, unchanged: Vec<String>) -> Self {
        let has_changes = !actions.is_empty();
        Self {
            actions,
            unchanged,
            has_changes,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            no_change: self.unchanged.len(),
        }
    }
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} unchanged",
            self.create, self.update, self.no_change
        )
    }
}

/// An orchestration job: an operation name plus a flat payload.
///
/// Serializes with the operation under `type` and every payload entry at the
/// top level, which is the shape the orchestration engine expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(rename = "type")]
    pub operation: String,

    #[serde(flatten)]
    pub payload: serde_json::Map<String, Value>,
}

impl Job {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            payload: serde_json::Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

/// Handle of a submitted orchestration task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Execution identifier assigned by the task launcher
    pub id: String,

    /// Human readable name (the submission description)
    pub name: String,
}
