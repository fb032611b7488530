//! Scale rule specification, as stored by the rule storage provider.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use stratus_shared::{ClusterId, SkuId};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MalformedSpec {
    #[error("size bounds inverted: min_size {min_size} > max_size {max_size}")]
    SizeBoundsInverted { min_size: u32, max_size: u32 },

    #[error(
        "idle window inverted: min_idle_to_keep {min_idle_to_keep} > max_idle_to_keep {max_idle_to_keep}"
    )]
    IdleWindowInverted {
        min_idle_to_keep: u32,
        max_idle_to_keep: u32,
    },
}

/// Desired idle-buffer policy for one SKU of one cluster.
///
/// The scaler keeps `idle_count` within `[min_idle_to_keep, max_idle_to_keep]`
/// while never moving the total size outside `[min_size, max_size]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleSpec {
    pub cluster_id: ClusterId,
    pub sku_id: SkuId,
    pub min_size: u32,
    pub max_size: u32,
    pub min_idle_to_keep: u32,
    pub max_idle_to_keep: u32,
    pub cool_down_secs: u32,
}

impl ScaleSpec {
    pub fn cool_down(&self) -> Duration {
        Duration::from_secs(u64::from(self.cool_down_secs))
    }

    /// A spec that fails validation is dropped at ingest, never applied.
    pub fn validate(&self) -> Result<(), MalformedSpec> {
        if self.min_size > self.max_size {
            return Err(MalformedSpec::SizeBoundsInverted {
                min_size: self.min_size,
                max_size: self.max_size,
            });
        }
        if self.min_idle_to_keep > self.max_idle_to_keep {
            return Err(MalformedSpec::IdleWindowInverted {
                min_idle_to_keep: self.min_idle_to_keep,
                max_idle_to_keep: self.max_idle_to_keep,
            });
        }
        Ok(())
    }
}
