//! Scale decisions produced by rule evaluation.

use serde::{Deserialize, Serialize};
use stratus_shared::{ClusterId, SkuId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScaleType {
    ScaleUp,
    ScaleDown,
    /// The rule wanted to grow but the SKU is pinned at `max_size`.
    NoOpReachMax,
    /// The rule wanted to shrink but the SKU is pinned at `min_size`.
    NoOpReachMin,
}

impl ScaleType {
    /// NoOp decisions advance saturation counters only; they are never
    /// forwarded to the provisioner.
    pub fn is_no_op(&self) -> bool {
        matches!(self, ScaleType::NoOpReachMax | ScaleType::NoOpReachMin)
    }
}

/// Outcome of applying a rule to one usage snapshot. `desire_size` is the
/// target total count after the action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleDecision {
    pub cluster_id: ClusterId,
    pub sku_id: SkuId,
    pub desire_size: u32,
    pub min_size: u32,
    pub max_size: u32,
    pub scale_type: ScaleType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_op_classification() {
        assert!(ScaleType::NoOpReachMax.is_no_op());
        assert!(ScaleType::NoOpReachMin.is_no_op());
        assert!(!ScaleType::ScaleUp.is_no_op());
        assert!(!ScaleType::ScaleDown.is_no_op());
    }
}
