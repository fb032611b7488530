//! Usage snapshots and idle-instance listings, as reported by the
//! cluster-state authority.

use serde::{Deserialize, Serialize};
use stratus_shared::{ClusterId, InstanceId, SkuId};

/// Descriptor of a machine class. Agents registered before machine
/// definitions existed report without one; such usages are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDefinition {
    pub definition_id: String,
}

impl MachineDefinition {
    pub fn new(definition_id: impl Into<String>) -> Self {
        Self {
            definition_id: definition_id.into(),
        }
    }

    /// SKU this definition belongs to, or `None` for legacy definitions with
    /// an empty id.
    pub fn sku_id(&self) -> Option<SkuId> {
        if self.definition_id.is_empty() {
            None
        } else {
            Some(SkuId::new(self.definition_id.clone()))
        }
    }
}

/// Instantaneous agent counts for one machine definition.
///
/// `0 <= idle_count <= total_count`; counts are snapshots, not monotonic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageByMachineDefinition {
    pub def: Option<MachineDefinition>,
    pub total_count: u32,
    pub idle_count: u32,
}

/// Reply to a cluster-usage pull. The usage sequence may be empty; entries
/// are processed independently and order carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageResponse {
    pub cluster_id: ClusterId,
    pub usages: Vec<UsageByMachineDefinition>,
}

/// Request for the concrete idle instances to remove after a scale-down
/// decision sized the removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleInstancesQuery {
    pub cluster_id: ClusterId,
    pub sku_id: SkuId,
    pub machine_def: MachineDefinition,
    pub desire_size: u32,
    pub max_instance_count: u32,
}

/// Reply listing idle instances; the authority returns at most
/// `max_instance_count` ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdleInstancesResponse {
    pub sku_id: SkuId,
    pub desire_size: u32,
    pub instance_ids: Vec<InstanceId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_definition_id_is_legacy() {
        assert_eq!(MachineDefinition::new("").sku_id(), None);
        assert_eq!(
            MachineDefinition::new("sku1").sku_id(),
            Some(SkuId::new("sku1"))
        );
    }
}
