pub mod apply;
pub mod export;
pub mod plan;
pub mod status;
