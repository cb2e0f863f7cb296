//! Coordinator — owns the poller lifecycle and wires
//! poll → rule match → store → dispatch → observer broadcast.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::actions::Target;
use crate::cluster::ClusterCapability;
use crate::dispatcher::Dispatcher;
use crate::model::{ParsedError, RemediationStatus};
use crate::poller::{Handler, LogSource, Poller};
use crate::rules::RuleEngine;
use crate::store::Store;

use super::events::ObserverEvent;

const OBSERVER_CHANNEL_CAPACITY: usize = 256;

pub struct Coordinator<S: LogSource + 'static> {
    poller: Arc<Poller<S>>,
    rule_engine: Arc<RuleEngine>,
    store: Arc<Store>,
    dispatcher: Arc<Dispatcher>,
    cluster: Arc<dyn ClusterCapability>,
    observers: broadcast::Sender<ObserverEvent>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S: LogSource + 'static> Coordinator<S> {
    pub fn new(
        poller: Poller<S>,
        rule_engine: RuleEngine,
        store: Store,
        dispatcher: Dispatcher,
        cluster: Arc<dyn ClusterCapability>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (observers, _) = broadcast::channel(OBSERVER_CHANNEL_CAPACITY);
        Self {
            poller: Arc::new(poller),
            rule_engine: Arc::new(rule_engine),
            store: Arc::new(store),
            dispatcher: Arc::new(dispatcher),
            cluster,
            observers,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn store(&self) -> Arc<Store> {
        self.store.clone()
    }

    pub fn rule_engine(&self) -> Arc<RuleEngine> {
        self.rule_engine.clone()
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        self.dispatcher.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ObserverEvent> {
        self.observers.subscribe()
    }

    pub(super) fn observers(&self) -> broadcast::Sender<ObserverEvent> {
        self.observers.clone()
    }

    fn handler(&self) -> Handler {
        let rule_engine = self.rule_engine.clone();
        let store = self.store.clone();
        let dispatcher = self.dispatcher.clone();
        let cluster = self.cluster.clone();
        let observers = self.observers.clone();

        Arc::new(move |batch: Vec<ParsedError>| {
            let rule_engine = rule_engine.clone();
            let store = store.clone();
            let dispatcher = dispatcher.clone();
            let cluster = cluster.clone();
            let observers = observers.clone();

            Box::pin(async move {
                for error in batch {
                    let matched = rule_engine.matches(&error);
                    let rule_name = matched.rule_name.clone();
                    store.save_error(matched.clone());

                    let stored = store.get_error_by_fingerprint(&matched.error.fingerprint);
                    if let Some(stored) = stored.clone() {
                        let _ = observers.send(ObserverEvent::NewError(stored));
                    }

                    if let Some(remediation) = rule_engine.remediation_for(&rule_name) {
                        let target = Target::for_pod(&matched.error.namespace, &matched.error.pod, &matched.error.container);
                        let (log, _err) =
                            dispatcher.execute(&matched, &rule_name, Some(&remediation), &target, cluster.as_ref()).await;

                        if log.status == RemediationStatus::Success && !log.dry_run {
                            if let Some(mut stored) = stored.clone() {
                                stored.remediated = true;
                                stored.remediated_at = Some(log.timestamp);
                                let _ = store.update_error(stored);
                            }
                        }

                        store.save_remediation_log(log.clone());
                        let _ = observers.send(ObserverEvent::NewRemediation(log));
                    }
                }
                let _ = observers.send(ObserverEvent::StatsUpdated(store.stats()));
            })
        })
    }

    /// Run until `shutdown()` is called; awaits the poller's return before
    /// this future resolves.
    pub async fn run(&self) {
        info!("coordinator starting poll loop");
        self.poller.run(self.handler(), self.shutdown_rx.clone()).await;
        info!("coordinator poll loop stopped");
    }

    pub fn shutdown(&self) {
        if self.shutdown_tx.send(true).is_err() {
            warn!("shutdown signalled after coordinator already stopped");
        }
    }
}
