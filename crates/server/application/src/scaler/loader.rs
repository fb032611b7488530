//! Pulls the durable rule set for one cluster from storage.

use std::collections::HashMap;
use std::sync::Arc;
use stratus_server_domain::scaling::{PortError, ScaleRuleStore, ScaleSpec};
use stratus_shared::{ClusterId, SkuId};
use tracing::debug;

/// Thin fetch service over the rule store; the scaler loop decides what to do
/// with the result (a failed fetch leaves the current registry untouched).
#[derive(Clone)]
pub struct RuleLoader {
    cluster_id: ClusterId,
    store: Arc<dyn ScaleRuleStore>,
}

impl RuleLoader {
    pub fn new(cluster_id: ClusterId, store: Arc<dyn ScaleRuleStore>) -> Self {
        Self { cluster_id, store }
    }

    pub async fn fetch(&self) -> Result<HashMap<SkuId, ScaleSpec>, PortError> {
        let rule_set = self.store.scale_rules(&self.cluster_id).await?;
        debug!(
            cluster_id = %self.cluster_id,
            rules = rule_set.scale_rules.len(),
            "fetched scale rule set"
        );
        Ok(rule_set.scale_rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stratus_server_domain::scaling::ScaleRuleSet;

    struct StaticStore {
        rules: HashMap<SkuId, ScaleSpec>,
    }

    #[async_trait]
    impl ScaleRuleStore for StaticStore {
        async fn scale_rules(&self, cluster_id: &ClusterId) -> Result<ScaleRuleSet, PortError> {
            Ok(ScaleRuleSet {
                cluster_id: cluster_id.clone(),
                scale_rules: self.rules.clone(),
            })
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ScaleRuleStore for FailingStore {
        async fn scale_rules(&self, _cluster_id: &ClusterId) -> Result<ScaleRuleSet, PortError> {
            Err(PortError::Timeout("rule store unreachable".to_string()))
        }
    }

    fn spec(sku: &str) -> ScaleSpec {
        ScaleSpec {
            cluster_id: ClusterId::new("cluster-1"),
            sku_id: SkuId::new(sku),
            min_size: 1,
            max_size: 10,
            min_idle_to_keep: 2,
            max_idle_to_keep: 4,
            cool_down_secs: 60,
        }
    }

    #[tokio::test]
    async fn fetch_returns_stored_rules() {
        let mut rules = HashMap::new();
        rules.insert(SkuId::new("sku1"), spec("sku1"));
        let loader = RuleLoader::new(
            ClusterId::new("cluster-1"),
            Arc::new(StaticStore { rules }),
        );

        let fetched = loader.fetch().await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert!(fetched.contains_key(&SkuId::new("sku1")));
    }

    #[tokio::test]
    async fn fetch_surfaces_store_errors() {
        let loader = RuleLoader::new(ClusterId::new("cluster-1"), Arc::new(FailingStore));
        assert!(matches!(loader.fetch().await, Err(PortError::Timeout(_))));
    }
}
