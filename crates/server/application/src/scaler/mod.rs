//! Resource Cluster Scaler
//!
//! A periodic control loop, one per cluster, that keeps the number of
//! worker-execution agents within configured bounds by reacting to
//! idle-capacity snapshots. All state mutation is serialized through a
//! single-consumer inbox; collaborator I/O completes by posting typed
//! messages back into that inbox.

pub mod actor;
pub mod loader;
pub mod metrics;
pub mod registry;

pub use actor::{ScalerError, ScalerHandle, ScalerLoop, ScalerLoopBuilder, ScalerMsg};
pub use loader::RuleLoader;
pub use metrics::ScalerMetrics;
pub use registry::RuleRegistry;
