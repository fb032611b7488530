//! Contracts of the scaler's external collaborators.
//!
//! The scaler owns none of these: the cluster-state authority tracks live
//! agents, the provisioner launches and terminates instances, and the rule
//! store holds the durable rule set. Failures here are transient from the
//! scaler's point of view; the timers retry implicitly.

use crate::scaling::request::ScaleRequest;
use crate::scaling::spec::ScaleSpec;
use crate::scaling::usage::{IdleInstancesQuery, IdleInstancesResponse, UsageResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use stratus_shared::{ClusterId, SkuId};

#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("collaborator not ready: {0}")]
    NotReady(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Durable rule set for one cluster, keyed by SKU. May be empty.
#[derive(Debug, Clone)]
pub struct ScaleRuleSet {
    pub cluster_id: ClusterId,
    pub scale_rules: HashMap<SkuId, ScaleSpec>,
}

impl ScaleRuleSet {
    pub fn empty(cluster_id: ClusterId) -> Self {
        Self {
            cluster_id,
            scale_rules: HashMap::new(),
        }
    }
}

/// Read access to the authority tracking live agents and their usage.
#[async_trait]
pub trait ClusterStateSource: Send + Sync {
    /// Snapshot of per-machine-definition usage for the whole cluster.
    async fn cluster_usage(&self, cluster_id: &ClusterId) -> Result<UsageResponse, PortError>;

    /// Concrete idle instances eligible for removal, capped at
    /// `query.max_instance_count`.
    async fn idle_instances(
        &self,
        query: IdleInstancesQuery,
    ) -> Result<IdleInstancesResponse, PortError>;
}

/// The provisioner that actually launches or terminates instances.
///
/// Fire-and-forget at this layer; the provisioner deduplicates on
/// `ScaleRequest::request_id` within a short window.
#[async_trait]
pub trait InstanceProvisioner: Send + Sync {
    async fn request_scale(&self, request: ScaleRequest) -> Result<(), PortError>;
}

/// Durable storage of scale rules.
#[async_trait]
pub trait ScaleRuleStore: Send + Sync {
    async fn scale_rules(&self, cluster_id: &ClusterId) -> Result<ScaleRuleSet, PortError>;
}
