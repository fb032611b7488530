//! In-memory rule registry, keyed by SKU.

use std::collections::HashMap;
use std::sync::Arc;
use stratus_server_domain::clock::Clock;
use stratus_server_domain::scaling::{ScaleRule, ScaleSpec};
use stratus_shared::SkuId;
use tracing::{debug, info, warn};

/// Maps each SKU to its live `ScaleRule`.
///
/// Mutated only from inside the scaler loop; external observers get cloned
/// snapshots.
pub struct RuleRegistry {
    clock: Arc<dyn Clock>,
    rules: HashMap<SkuId, ScaleRule>,
}

impl RuleRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            rules: HashMap::new(),
        }
    }

    pub fn get_mut(&mut self, sku_id: &SkuId) -> Option<&mut ScaleRule> {
        self.rules.get_mut(sku_id)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Immutable view of the current rule set.
    pub fn snapshot(&self) -> HashMap<SkuId, ScaleRule> {
        self.rules.clone()
    }

    /// Atomically align the registry with a fetched rule set: insert rules
    /// for new SKUs, update existing ones in place (cooldown state is
    /// preserved), remove SKUs absent from the fetch. Malformed specs are
    /// dropped with a warning and never applied.
    pub fn replace(&mut self, specs: HashMap<SkuId, ScaleSpec>) {
        self.rules.retain(|sku_id, _| {
            let keep = specs.contains_key(sku_id);
            if !keep {
                info!(sku_id = %sku_id, "removing scale rule absent from fetched rule set");
            }
            keep
        });

        for (sku_id, spec) in specs {
            if let Err(reason) = spec.validate() {
                warn!(sku_id = %sku_id, %reason, "dropping malformed scale spec");
                self.rules.remove(&sku_id);
                continue;
            }
            match self.rules.get_mut(&sku_id) {
                Some(rule) => {
                    debug!(sku_id = %sku_id, "updating scale rule in place");
                    rule.update_spec(spec);
                }
                None => {
                    info!(sku_id = %sku_id, "adding scale rule");
                    self.rules
                        .insert(sku_id, ScaleRule::new(spec, Arc::clone(&self.clock)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use stratus_server_domain::clock::ManualClock;
    use stratus_server_domain::scaling::UsageByMachineDefinition;
    use stratus_shared::ClusterId;

    fn spec(sku: &str, max_size: u32) -> ScaleSpec {
        ScaleSpec {
            cluster_id: ClusterId::new("cluster-1"),
            sku_id: SkuId::new(sku),
            min_size: 1,
            max_size,
            min_idle_to_keep: 2,
            max_idle_to_keep: 4,
            cool_down_secs: 60,
        }
    }

    fn specs(entries: Vec<ScaleSpec>) -> HashMap<SkuId, ScaleSpec> {
        entries.into_iter().map(|s| (s.sku_id.clone(), s)).collect()
    }

    fn usage(total_count: u32, idle_count: u32) -> UsageByMachineDefinition {
        UsageByMachineDefinition {
            def: None,
            total_count,
            idle_count,
        }
    }

    #[test]
    fn replace_aligns_keys_with_fetch() {
        let mut registry = RuleRegistry::new(Arc::new(ManualClock::new()));
        registry.replace(specs(vec![spec("sku1", 10), spec("sku2", 10)]));
        assert_eq!(registry.len(), 2);

        registry.replace(specs(vec![spec("sku2", 20), spec("sku3", 10)]));
        assert_eq!(registry.len(), 2);
        assert!(registry.get_mut(&SkuId::new("sku1")).is_none());
        assert!(registry.get_mut(&SkuId::new("sku3")).is_some());
        let sku2 = registry.get_mut(&SkuId::new("sku2")).unwrap();
        assert_eq!(sku2.spec().max_size, 20);
    }

    #[test]
    fn replace_with_empty_set_clears_registry() {
        let mut registry = RuleRegistry::new(Arc::new(ManualClock::new()));
        registry.replace(specs(vec![spec("sku1", 10)]));
        registry.replace(HashMap::new());
        assert!(registry.is_empty());
    }

    #[test]
    fn malformed_spec_is_dropped() {
        let mut registry = RuleRegistry::new(Arc::new(ManualClock::new()));
        let mut bad = spec("sku-bad", 10);
        bad.min_size = 11;
        registry.replace(specs(vec![spec("sku1", 10), bad]));
        assert_eq!(registry.len(), 1);
        assert!(registry.get_mut(&SkuId::new("sku-bad")).is_none());
    }

    #[test]
    fn malformed_update_evicts_existing_rule() {
        let mut registry = RuleRegistry::new(Arc::new(ManualClock::new()));
        registry.replace(specs(vec![spec("sku1", 10)]));

        let mut bad = spec("sku1", 10);
        bad.min_idle_to_keep = 9;
        registry.replace(specs(vec![bad]));
        assert!(registry.is_empty());
    }

    #[test]
    fn replace_preserves_cooldown_state() {
        let clock = ManualClock::new();
        let mut registry = RuleRegistry::new(Arc::new(clock.clone()));
        registry.replace(specs(vec![spec("sku1", 10)]));

        let sku1 = SkuId::new("sku1");
        assert!(registry.get_mut(&sku1).unwrap().apply(&usage(5, 0)).is_some());

        // Refresh with an identical spec; the cooldown must still hold.
        registry.replace(specs(vec![spec("sku1", 10)]));
        clock.advance(Duration::from_secs(30));
        assert!(registry.get_mut(&sku1).unwrap().apply(&usage(7, 0)).is_none());
    }

    #[test]
    fn snapshot_reflects_current_rules() {
        let mut registry = RuleRegistry::new(Arc::new(ManualClock::new()));
        registry.replace(specs(vec![spec("sku1", 10), spec("sku2", 10)]));
        let snapshot = registry.snapshot();
        let mut keys: Vec<_> = snapshot.keys().map(|k| k.as_str().to_string()).collect();
        keys.sort();
        assert_eq!(keys, vec!["sku1", "sku2"]);
    }
}
