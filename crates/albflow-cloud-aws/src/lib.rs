//! AWS application load balancer handler for albflow
//!
//! This crate implements the `ResourceHandler` trait for regional
//! application load balancers: it resolves a spec with per-region overrides
//! into desired state, fetches live state from every region concurrently,
//! submits one idempotent `upsertLoadBalancer` job per drifted region, and
//! exports live state back into a compact spec.
//!
//! # Example
//!
//! ```ignore
//! use albflow_cloud::{ResourceDiff, ResourceHandler};
//! use albflow_cloud_aws::{ApplicationLoadBalancerHandler, SnapshotBackend, SnapshotStore};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(SnapshotBackend::open(SnapshotStore::new(".albflow")).await?);
//! let handler = ApplicationLoadBalancerHandler::new(
//!     backend.clone(),
//!     backend.clone(),
//!     backend.clone(),
//!     backend,
//! );
//!
//! let resource = handler.resource(spec);
//! let desired = handler.resolve(&resource).await?;
//! let current = handler.current(&resource).await?;
//! let tasks = handler
//!     .upsert(&resource, &ResourceDiff::new(desired, Some(current)))
//!     .await?;
//! ```

pub mod cloud;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod handler;
pub mod job;
pub mod model;
pub mod resolver;
pub mod snapshot;

pub use cloud::{
    ApplicationLoadBalancerModel, Certificate, CloudStateService, Network, NetworkLookup,
};
pub use error::{AlbError, Result};
pub use export::{export_spec, normalize_zones, override_field, region_override};
pub use fetcher::CurrentStateFetcher;
pub use handler::{ApplicationLoadBalancerHandler, RegionalDiff};
pub use job::{UPSERT_LOAD_BALANCER, upsert_job};
pub use model::{
    ApplicationLoadBalancer, ApplicationLoadBalancerOverride, ApplicationLoadBalancerSpec,
    HealthCheck, KIND, Listener, ListenerAction, LoadBalancerDependencies, Location, Moniker,
    Rule, SubnetAwareLocations, SubnetAwareRegionSpec, TargetGroup,
};
pub use resolver::{resolve_desired, with_default_zones};
pub use snapshot::{CloudSnapshot, SnapshotBackend, SnapshotStore};
