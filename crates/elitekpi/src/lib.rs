//! Efficiency scoring and dashboard metrics for real-estate agents.

pub mod config;
pub mod dashboard;
pub mod efficiency;
pub mod error;
pub mod records;
pub mod session;
pub mod telemetry;
