//! Scale request envelope sent to the provisioner.

use serde::{Deserialize, Serialize};
use std::fmt;
use stratus_shared::{ClusterId, InstanceId, SkuId};

/// Deployment environment of the target cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvType {
    Prod,
    Dev,
}

impl fmt::Display for EnvType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvType::Prod => write!(f, "Prod"),
            EnvType::Dev => write!(f, "Dev"),
        }
    }
}

/// Fire-and-forget provisioning request. `idle_instances` is empty for a
/// scale-up and carries the instances to retire for a scale-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleRequest {
    pub cluster_id: ClusterId,
    pub sku_id: SkuId,
    pub region: Option<String>,
    pub env_type: Option<EnvType>,
    pub desire_size: u32,
    pub idle_instances: Vec<InstanceId>,
}

impl ScaleRequest {
    pub fn scale_up(cluster_id: ClusterId, sku_id: SkuId, desire_size: u32) -> Self {
        Self {
            cluster_id,
            sku_id,
            region: None,
            env_type: None,
            desire_size,
            idle_instances: Vec::new(),
        }
    }

    pub fn scale_down(
        cluster_id: ClusterId,
        sku_id: SkuId,
        desire_size: u32,
        idle_instances: Vec<InstanceId>,
    ) -> Self {
        Self {
            cluster_id,
            sku_id,
            region: None,
            env_type: None,
            desire_size,
            idle_instances,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_env_type(mut self, env_type: EnvType) -> Self {
        self.env_type = Some(env_type);
        self
    }

    /// Idempotency key the provisioner deduplicates on within a short
    /// window. Absent optional fields render as empty segments.
    pub fn request_id(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.cluster_id,
            self.region.as_deref().unwrap_or(""),
            self.env_type.map(|e| e.to_string()).unwrap_or_default(),
            self.sku_id,
            self.desire_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_up_has_no_idle_instances() {
        let req = ScaleRequest::scale_up(ClusterId::new("c1"), SkuId::new("sku1"), 7);
        assert!(req.idle_instances.is_empty());
        assert_eq!(req.desire_size, 7);
    }

    #[test]
    fn request_id_renders_missing_optionals_as_empty() {
        let req = ScaleRequest::scale_up(ClusterId::new("c1"), SkuId::new("sku1"), 7);
        assert_eq!(req.request_id(), "c1---sku1-7");
    }

    #[test]
    fn request_id_includes_region_and_env() {
        let req = ScaleRequest::scale_down(
            ClusterId::new("c1"),
            SkuId::new("sku1"),
            3,
            vec![InstanceId::new("i-a")],
        )
        .with_region("us-east-1")
        .with_env_type(EnvType::Prod);
        assert_eq!(req.request_id(), "c1-us-east-1-Prod-sku1-3");
    }
}
