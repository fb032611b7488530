//! Scaler Loop Actor
//!
//! Single owner of the rule registry, processing a typed inbox one message at
//! a time. Two fixed-delay timers drive it: one pulls cluster usage, one
//! refreshes the rule set from storage. Handlers never await collaborator
//! I/O; every outbound call is spawned and completes by posting a typed
//! message back into the inbox, so all state transitions stay serialized.
//!
//! Scale-downs are two-phase: the rule sizes the removal, then the
//! cluster-state authority names the idle instances, and only then does the
//! provisioner request go out. The gap is covered by the rule's cooldown.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::scaler::loader::RuleLoader;
use crate::scaler::metrics::ScalerMetrics;
use crate::scaler::registry::RuleRegistry;
use stratus_server_domain::clock::{Clock, SystemClock};
use stratus_server_domain::scaling::{
    ClusterStateSource, IdleInstancesQuery, IdleInstancesResponse, InstanceProvisioner,
    ScaleRequest, ScaleRule, ScaleRuleStore, ScaleSpec, ScaleType, UsageResponse,
};
use stratus_shared::{ClusterId, ScalerConfig, SkuId};

/// Errors from `ScalerHandle` operations.
#[derive(Debug, Error)]
pub enum ScalerError {
    #[error("scaler inbox closed")]
    InboxClosed,

    #[error("scaler reply dropped")]
    ReplyDropped,
}

/// Inbox protocol of the scaler loop.
#[derive(Debug)]
pub enum ScalerMsg {
    /// Periodic trigger to pull cluster usage.
    TickUsage,

    /// Periodic trigger to refresh the rule set from storage.
    TickRuleRefresh,

    /// Usage snapshot arrived from the cluster-state authority.
    UsageReport(UsageResponse),

    /// Idle-instance listing arrived for an in-flight scale-down.
    IdleInstances(IdleInstancesResponse),

    /// A storage fetch completed. `seq` was stamped at issue time; only the
    /// newest fetch is ever applied.
    RulesFetched {
        seq: u64,
        specs: HashMap<SkuId, ScaleSpec>,
    },

    /// Observer request for an immutable snapshot of the live rules.
    GetRuleSet {
        reply_to: oneshot::Sender<HashMap<SkuId, ScaleRule>>,
    },

    /// Acknowledgement from a collaborator; logged only.
    Ack,
}

/// The scaler control loop. One instance per cluster; instances share no
/// mutable state.
pub struct ScalerLoop {
    cluster_id: ClusterId,
    config: ScalerConfig,
    inbox: mpsc::Receiver<ScalerMsg>,
    self_tx: mpsc::Sender<ScalerMsg>,
    shutdown: watch::Receiver<()>,
    registry: RuleRegistry,
    loader: RuleLoader,
    cluster_state: Arc<dyn ClusterStateSource>,
    provisioner: Arc<dyn InstanceProvisioner>,
    metrics: Arc<ScalerMetrics>,
    issued_fetch_seq: u64,
    applied_fetch_seq: u64,
}

impl ScalerLoop {
    /// Run until shutdown is signalled. Stopping cancels both timers; replies
    /// still in flight land in a dropped inbox and are discarded.
    pub async fn run(mut self) {
        info!(cluster_id = %self.cluster_id, "starting resource cluster scaler");

        // Rules are loaded once up front so the first usage tick can act
        // without waiting a full refresh period.
        self.spawn_rule_fetch();

        let mut usage_tick = interval_at(
            Instant::now() + self.config.scaler_pull_threshold,
            self.config.scaler_pull_threshold,
        );
        usage_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut refresh_tick = interval_at(
            Instant::now() + self.config.rule_set_refresh_threshold,
            self.config.rule_set_refresh_threshold,
        );
        refresh_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    info!(cluster_id = %self.cluster_id, "scaler shutdown signal received");
                    break;
                }
                _ = usage_tick.tick() => self.handle(ScalerMsg::TickUsage),
                _ = refresh_tick.tick() => self.handle(ScalerMsg::TickRuleRefresh),
                msg = self.inbox.recv() => match msg {
                    Some(msg) => self.handle(msg),
                    None => {
                        info!(cluster_id = %self.cluster_id, "scaler inbox closed");
                        break;
                    }
                },
            }
        }

        info!(cluster_id = %self.cluster_id, "resource cluster scaler stopped");
    }

    /// Dispatch one inbox message. Handlers are synchronous: any I/O they
    /// need is spawned, and its completion re-enters the inbox.
    fn handle(&mut self, msg: ScalerMsg) {
        match msg {
            ScalerMsg::TickUsage => self.on_tick_usage(),
            ScalerMsg::TickRuleRefresh => self.on_tick_rule_refresh(),
            ScalerMsg::UsageReport(response) => self.on_usage_report(response),
            ScalerMsg::IdleInstances(response) => self.on_idle_instances(response),
            ScalerMsg::RulesFetched { seq, specs } => self.on_rules_fetched(seq, specs),
            ScalerMsg::GetRuleSet { reply_to } => {
                let _ = reply_to.send(self.registry.snapshot());
            }
            ScalerMsg::Ack => {
                debug!(cluster_id = %self.cluster_id, "ack received");
            }
        }
    }

    fn on_tick_usage(&mut self) {
        if self.registry.is_empty() {
            debug!(cluster_id = %self.cluster_id, "scaler disabled: no rules loaded");
            return;
        }

        let source = Arc::clone(&self.cluster_state);
        let cluster_id = self.cluster_id.clone();
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            match source.cluster_usage(&cluster_id).await {
                Ok(response) => {
                    let _ = tx.send(ScalerMsg::UsageReport(response)).await;
                }
                Err(error) => {
                    warn!(
                        cluster_id = %cluster_id,
                        %error,
                        "cluster usage pull failed, next tick retries"
                    );
                }
            }
        });
    }

    fn on_tick_rule_refresh(&mut self) {
        debug!(cluster_id = %self.cluster_id, "requesting rule set refresh");
        self.spawn_rule_fetch();
    }

    fn spawn_rule_fetch(&mut self) {
        self.issued_fetch_seq += 1;
        let seq = self.issued_fetch_seq;
        let loader = self.loader.clone();
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            match loader.fetch().await {
                Ok(specs) => {
                    let _ = tx.send(ScalerMsg::RulesFetched { seq, specs }).await;
                }
                Err(error) => {
                    warn!(%error, "scale rule fetch failed, keeping current rule set");
                }
            }
        });
    }

    fn on_rules_fetched(&mut self, seq: u64, specs: HashMap<SkuId, ScaleSpec>) {
        if seq <= self.applied_fetch_seq {
            debug!(cluster_id = %self.cluster_id, seq, "ignoring stale rule fetch");
            return;
        }
        self.applied_fetch_seq = seq;
        self.registry.replace(specs);
        info!(
            cluster_id = %self.cluster_id,
            rules = self.registry.len(),
            "refreshed scale rule set"
        );
    }

    fn on_usage_report(&mut self, response: UsageResponse) {
        self.metrics.record_rule_trigger();

        for usage in &response.usages {
            let Some(def) = usage.def.as_ref() else {
                debug!(
                    cluster_id = %self.cluster_id,
                    "ignoring usage without machine definition"
                );
                continue;
            };
            let Some(sku_id) = def.sku_id() else {
                debug!(
                    cluster_id = %self.cluster_id,
                    "ignoring usage with empty definition id"
                );
                continue;
            };

            let decision = match self.registry.get_mut(&sku_id) {
                Some(rule) => rule.apply(usage),
                None => {
                    info!(
                        cluster_id = %self.cluster_id,
                        sku_id = %sku_id,
                        "no scale rule for sku"
                    );
                    continue;
                }
            };
            let Some(decision) = decision else {
                continue;
            };

            info!(cluster_id = %self.cluster_id, ?decision, "scale decision");
            match decision.scale_type {
                ScaleType::ScaleUp => {
                    self.metrics.record_scale_up();
                    self.dispatch_scale_request(ScaleRequest::scale_up(
                        self.cluster_id.clone(),
                        decision.sku_id,
                        decision.desire_size,
                    ));
                }
                ScaleType::ScaleDown => {
                    // Phase one done: the removal is sized. Ask the authority
                    // which instances to retire; the provisioner request goes
                    // out when the listing comes back.
                    self.metrics.record_scale_down();
                    self.spawn_idle_instances_query(IdleInstancesQuery {
                        cluster_id: self.cluster_id.clone(),
                        sku_id: decision.sku_id,
                        machine_def: def.clone(),
                        desire_size: decision.desire_size,
                        max_instance_count: usage
                            .total_count
                            .saturating_sub(decision.desire_size),
                    });
                }
                ScaleType::NoOpReachMax => self.metrics.record_reach_max_limit(),
                ScaleType::NoOpReachMin => self.metrics.record_reach_min_limit(),
            }
        }
    }

    fn spawn_idle_instances_query(&self, query: IdleInstancesQuery) {
        let source = Arc::clone(&self.cluster_state);
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            match source.idle_instances(query).await {
                Ok(response) => {
                    let _ = tx.send(ScalerMsg::IdleInstances(response)).await;
                }
                Err(error) => {
                    warn!(%error, "idle instances query failed, dropping scale-down");
                }
            }
        });
    }

    fn on_idle_instances(&mut self, response: IdleInstancesResponse) {
        // The authority's selection is forwarded verbatim.
        self.dispatch_scale_request(ScaleRequest::scale_down(
            self.cluster_id.clone(),
            response.sku_id,
            response.desire_size,
            response.instance_ids,
        ));
    }

    fn dispatch_scale_request(&self, request: ScaleRequest) {
        info!(
            cluster_id = %self.cluster_id,
            request_id = %request.request_id(),
            idle_instances = request.idle_instances.len(),
            "dispatching scale request"
        );
        let provisioner = Arc::clone(&self.provisioner);
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            match provisioner.request_scale(request).await {
                Ok(()) => {
                    let _ = tx.send(ScalerMsg::Ack).await;
                }
                Err(error) => {
                    warn!(%error, "scale request dispatch failed");
                }
            }
        });
    }
}

/// Cloneable handle for observing a running scaler loop.
#[derive(Clone)]
pub struct ScalerHandle {
    tx: mpsc::Sender<ScalerMsg>,
}

impl ScalerHandle {
    /// Immutable snapshot of the live rule set.
    pub async fn rule_set(&self) -> Result<HashMap<SkuId, ScaleRule>, ScalerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(ScalerMsg::GetRuleSet { reply_to: reply_tx })
            .await
            .map_err(|_| ScalerError::InboxClosed)?;
        reply_rx.await.map_err(|_| ScalerError::ReplyDropped)
    }
}

/// Builder wiring a `ScalerLoop` to its collaborators.
pub struct ScalerLoopBuilder {
    config: ScalerConfig,
    cluster_state: Arc<dyn ClusterStateSource>,
    provisioner: Arc<dyn InstanceProvisioner>,
    rule_store: Arc<dyn ScaleRuleStore>,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<ScalerMetrics>>,
    shutdown: Option<watch::Sender<()>>,
}

impl ScalerLoopBuilder {
    pub fn new(
        config: ScalerConfig,
        cluster_state: Arc<dyn ClusterStateSource>,
        provisioner: Arc<dyn InstanceProvisioner>,
        rule_store: Arc<dyn ScaleRuleStore>,
    ) -> Self {
        Self {
            config,
            cluster_state,
            provisioner,
            rule_store,
            clock: Arc::new(SystemClock),
            metrics: None,
            shutdown: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ScalerMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_shutdown(mut self, shutdown: watch::Sender<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Build the loop and its handle. The loop does nothing until `run` is
    /// awaited (usually via `tokio::spawn`).
    pub fn build(self) -> (ScalerHandle, ScalerLoop, watch::Sender<()>) {
        let (tx, rx) = mpsc::channel(self.config.inbox_capacity);
        let shutdown_tx = self.shutdown.unwrap_or_else(|| watch::channel(()).0);
        let shutdown = shutdown_tx.subscribe();

        let cluster_id = self.config.cluster_id.clone();
        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(ScalerMetrics::new(cluster_id.clone())));

        let scaler = ScalerLoop {
            cluster_id: cluster_id.clone(),
            registry: RuleRegistry::new(Arc::clone(&self.clock)),
            loader: RuleLoader::new(cluster_id, self.rule_store),
            config: self.config,
            inbox: rx,
            self_tx: tx.clone(),
            shutdown,
            cluster_state: self.cluster_state,
            provisioner: self.provisioner,
            metrics,
            issued_fetch_seq: 0,
            applied_fetch_seq: 0,
        };

        (ScalerHandle { tx }, scaler, shutdown_tx)
    }
}
