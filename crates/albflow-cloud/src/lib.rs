//! albflow cloud abstraction
//!
//! This crate provides the generic pieces every albflow resource handler is
//! built from: the handler contract, the diff primitive comparing desired and
//! current state, and the job/task types exchanged with the orchestration
//! engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                   albflow CLI                     │
//! │          (albflow plan/apply/export)              │
//! └─────────────────┬────────────────────────────────┘
//!                   │
//! ┌─────────────────▼────────────────────────────────┐
//! │                albflow-cloud                      │
//! │  ┌──────────────────────────────────────────┐    │
//! │  │   trait ResourceHandler { ... }           │    │
//! │  └──────────────────────────────────────────┘    │
//! │  ┌──────────────┐  ┌────────────────────────┐    │
//! │  │ ResourceDiff │  │ TaskLauncher / Query   │    │
//! │  └──────────────┘  └────────────────────────┘    │
//! └───────┬──────────────────────────────────────────┘
//!         │
//! ┌───────▼──────────────┐
//! │  albflow-cloud-aws   │
//! │  (application LB)    │
//! └──────────────────────┘
//! ```

pub mod action;
pub mod diff;
pub mod error;
pub mod handler;

// Re-exports
pub use action::{Action, ActionType, Job, Plan, PlanSummary, Task, correlation_key};
pub use diff::ResourceDiff;
pub use error::{CloudError, Result};
pub use handler::{
    ExecutionSummary, ExportRequest, OrchestrationQuery, Resource, ResourceHandler, ResourceRef,
    TaskLauncher,
};
