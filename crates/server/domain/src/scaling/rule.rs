//! Per-SKU scale rule with cooldown state.

use crate::clock::Clock;
use crate::scaling::decision::{ScaleDecision, ScaleType};
use crate::scaling::spec::ScaleSpec;
use crate::scaling::usage::UsageByMachineDefinition;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A `ScaleSpec` plus the mutable cooldown clock for one SKU.
///
/// Owned exclusively by the registry entry; every mutation happens inside the
/// scaler loop's serialized context.
#[derive(Clone)]
pub struct ScaleRule {
    spec: ScaleSpec,
    clock: Arc<dyn Clock>,
    last_action_at: Option<Instant>,
}

impl ScaleRule {
    pub fn new(spec: ScaleSpec, clock: Arc<dyn Clock>) -> Self {
        Self {
            spec,
            clock,
            last_action_at: None,
        }
    }

    pub fn spec(&self) -> &ScaleSpec {
        &self.spec
    }

    /// Swap in a refreshed spec, keeping the cooldown state so a rule update
    /// cannot re-trigger a decision early.
    pub fn update_spec(&mut self, spec: ScaleSpec) {
        self.spec = spec;
    }

    /// Evaluate one usage snapshot.
    ///
    /// The cooldown is charged on every evaluation that passes the gate, even
    /// when the outcome is a NoOp or no decision at all; this throttles churn
    /// of saturated rules against a chattier usage feed.
    pub fn apply(&mut self, usage: &UsageByMachineDefinition) -> Option<ScaleDecision> {
        let now = self.clock.now();
        if let Some(last) = self.last_action_at {
            if now.duration_since(last) < self.spec.cool_down() {
                debug!(
                    cluster_id = %self.spec.cluster_id,
                    sku_id = %self.spec.sku_id,
                    "cooldown active, skipping evaluation"
                );
                return None;
            }
        }
        self.last_action_at = Some(now);

        let decision = if usage.idle_count > self.spec.max_idle_to_keep {
            // Too many idle agents: shed down to the idle ceiling, floored at
            // min_size.
            let step = usage.idle_count - self.spec.max_idle_to_keep;
            let new_size = usage
                .total_count
                .saturating_sub(step)
                .max(self.spec.min_size);
            Some(self.decision(
                new_size,
                if new_size == usage.total_count {
                    ScaleType::NoOpReachMin
                } else {
                    ScaleType::ScaleDown
                },
            ))
        } else if usage.idle_count < self.spec.min_idle_to_keep {
            // Idle buffer too thin: grow toward the idle floor, capped at
            // max_size.
            let step = self.spec.min_idle_to_keep - usage.idle_count;
            let new_size = (usage.total_count + step).min(self.spec.max_size);
            Some(self.decision(
                new_size,
                if new_size == usage.total_count {
                    ScaleType::NoOpReachMax
                } else {
                    ScaleType::ScaleUp
                },
            ))
        } else {
            None
        };

        debug!(
            cluster_id = %self.spec.cluster_id,
            sku_id = %self.spec.sku_id,
            total_count = usage.total_count,
            idle_count = usage.idle_count,
            ?decision,
            "scale rule evaluated"
        );
        decision
    }

    fn decision(&self, new_size: u32, scale_type: ScaleType) -> ScaleDecision {
        ScaleDecision {
            cluster_id: self.spec.cluster_id.clone(),
            sku_id: self.spec.sku_id.clone(),
            desire_size: new_size,
            min_size: new_size,
            max_size: new_size,
            scale_type,
        }
    }
}

impl fmt::Debug for ScaleRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScaleRule")
            .field("spec", &self.spec)
            .field("last_action_at", &self.last_action_at)
            .finish()
    }
}
