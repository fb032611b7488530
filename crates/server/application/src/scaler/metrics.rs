//! Scaler counters, tagged with the owning cluster.

use std::sync::atomic::{AtomicU64, Ordering};
use stratus_shared::ClusterId;

/// Five monotone counters tallying rule triggers, scale actions and
/// saturation events. Injected as `Arc`; a passive reporting facet.
#[derive(Debug)]
pub struct ScalerMetrics {
    cluster_id: ClusterId,
    num_scale_rule_trigger: AtomicU64,
    num_scale_up: AtomicU64,
    num_scale_down: AtomicU64,
    num_reach_scale_max_limit: AtomicU64,
    num_reach_scale_min_limit: AtomicU64,
}

impl ScalerMetrics {
    pub fn new(cluster_id: ClusterId) -> Self {
        Self {
            cluster_id,
            num_scale_rule_trigger: AtomicU64::new(0),
            num_scale_up: AtomicU64::new(0),
            num_scale_down: AtomicU64::new(0),
            num_reach_scale_max_limit: AtomicU64::new(0),
            num_reach_scale_min_limit: AtomicU64::new(0),
        }
    }

    pub fn cluster_id(&self) -> &ClusterId {
        &self.cluster_id
    }

    /// Record one processed usage response.
    pub fn record_rule_trigger(&self) {
        self.num_scale_rule_trigger.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scale_up(&self) {
        self.num_scale_up.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scale_down(&self) {
        self.num_scale_down.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reach_max_limit(&self) {
        self.num_reach_scale_max_limit
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reach_min_limit(&self) {
        self.num_reach_scale_min_limit
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn num_scale_rule_trigger(&self) -> u64 {
        self.num_scale_rule_trigger.load(Ordering::Relaxed)
    }

    pub fn num_scale_up(&self) -> u64 {
        self.num_scale_up.load(Ordering::Relaxed)
    }

    pub fn num_scale_down(&self) -> u64 {
        self.num_scale_down.load(Ordering::Relaxed)
    }

    pub fn num_reach_scale_max_limit(&self) -> u64 {
        self.num_reach_scale_max_limit.load(Ordering::Relaxed)
    }

    pub fn num_reach_scale_min_limit(&self) -> u64 {
        self.num_reach_scale_min_limit.load(Ordering::Relaxed)
    }
}

impl Clone for ScalerMetrics {
    fn clone(&self) -> Self {
        Self {
            cluster_id: self.cluster_id.clone(),
            num_scale_rule_trigger: AtomicU64::new(self.num_scale_rule_trigger()),
            num_scale_up: AtomicU64::new(self.num_scale_up()),
            num_scale_down: AtomicU64::new(self.num_scale_down()),
            num_reach_scale_max_limit: AtomicU64::new(self.num_reach_scale_max_limit()),
            num_reach_scale_min_limit: AtomicU64::new(self.num_reach_scale_min_limit()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let metrics = ScalerMetrics::new(ClusterId::new("cluster-1"));
        assert_eq!(metrics.num_scale_rule_trigger(), 0);
        assert_eq!(metrics.num_scale_up(), 0);
        assert_eq!(metrics.num_scale_down(), 0);
        assert_eq!(metrics.num_reach_scale_max_limit(), 0);
        assert_eq!(metrics.num_reach_scale_min_limit(), 0);
    }

    #[test]
    fn counters_increment_independently() {
        let metrics = ScalerMetrics::new(ClusterId::new("cluster-1"));
        metrics.record_rule_trigger();
        metrics.record_rule_trigger();
        metrics.record_scale_up();
        metrics.record_reach_min_limit();

        assert_eq!(metrics.num_scale_rule_trigger(), 2);
        assert_eq!(metrics.num_scale_up(), 1);
        assert_eq!(metrics.num_scale_down(), 0);
        assert_eq!(metrics.num_reach_scale_min_limit(), 1);
    }

    #[test]
    fn clone_preserves_values() {
        let metrics = ScalerMetrics::new(ClusterId::new("cluster-1"));
        metrics.record_scale_down();
        let cloned = metrics.clone();
        assert_eq!(cloned.num_scale_down(), 1);
        assert_eq!(cloned.cluster_id().as_str(), "cluster-1");
    }
}
