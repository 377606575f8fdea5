//! Application load balancer handler error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlbError {
    #[error("Unable to determine VPC for load balancer {0}")]
    MissingNetwork(String),

    #[error("Unable to determine subnet for load balancer {0}")]
    MissingSubnet(String),

    #[error("Application load balancer {name} not found in {account} (regions: {regions})")]
    ResourceNotFound {
        name: String,
        account: String,
        regions: String,
    },

    #[error("Invalid live state for {name} in {region}: {message}")]
    InvalidLiveState {
        name: String,
        region: String,
        message: String,
    },

    #[error("Invalid moniker {0}: app and stack must be non-empty and contain no dashes")]
    InvalidMoniker(String),

    #[error("No desired state for region {0}")]
    MissingRegion(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cloud error: {0}")]
    Cloud(#[from] albflow_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, AlbError>;
