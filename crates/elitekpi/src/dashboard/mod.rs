//! Dashboard metrics: fetch an agent's records, score them, and keep a daily history.

pub mod router;
pub mod service;


pub use router::{dashboard_router, HistoryQuery, MetricsQuery};
pub use service::{DashboardError, DashboardService};
