//! Scaling domain: rules, decisions, usage snapshots and the contracts of the
//! external collaborators (cluster-state authority, provisioner, rule
//! storage).

pub mod decision;
pub mod ports;
pub mod request;
pub mod rule;
pub mod spec;
pub mod usage;

pub use decision::{ScaleDecision, ScaleType};
pub use ports::{
    ClusterStateSource, InstanceProvisioner, PortError, ScaleRuleSet, ScaleRuleStore,
};
pub use request::{EnvType, ScaleRequest};
pub use rule::ScaleRule;
pub use spec::{MalformedSpec, ScaleSpec};
pub use usage::{
    IdleInstancesQuery, IdleInstancesResponse, MachineDefinition, UsageByMachineDefinition,
    UsageResponse,
};
