//! Fake — test double for the cluster capability.
//!
//! Provides a deterministic [`FakeCluster`] that implements
//! [`ClusterCapability`] using in-memory state.

use std::collections::HashMap;
use std::pin::Pin;

use tokio::sync::Mutex;

use super::capability::{
    ClusterCapability, ClusterError, DeploymentRef, PodRef, Propagation, ReplicaSetRef,
};

#[derive(Default)]
struct Inner {
    pods: HashMap<(String, String), PodRef>,
    replica_sets: HashMap<(String, String), ReplicaSetRef>,
    deployments: HashMap<(String, String), DeploymentRef>,
    deleted_pods: Vec<(String, String)>,
    rollbacks: Vec<(String, String)>,
}

/// A fake cluster capability for deterministic testing. All methods
/// operate on in-memory state seeded via the `add_*`/`with_*` helpers.
pub struct FakeCluster {
    inner: Mutex<Inner>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()) }
    }

    pub async fn add_pod(&self, pod: PodRef) {
        let mut s = self.inner.lock().await;
        s.pods.insert((pod.namespace.clone(), pod.name.clone()), pod);
    }

    pub async fn add_replica_set(&self, rs: ReplicaSetRef) {
        let mut s = self.inner.lock().await;
        s.replica_sets.insert((rs.namespace.clone(), rs.name.clone()), rs);
    }

    pub async fn add_deployment(&self, d: DeploymentRef) {
        let mut s = self.inner.lock().await;
        s.deployments.insert((d.namespace.clone(), d.name.clone()), d);
    }

    pub async fn deleted_pods(&self) -> Vec<(String, String)> {
        self.inner.lock().await.deleted_pods.clone()
    }

    pub async fn rollbacks(&self) -> Vec<(String, String)> {
        self.inner.lock().await.rollbacks.clone()
    }

    pub async fn replicas_of(&self, namespace: &str, name: &str) -> Option<i32> {
        self.inner
            .lock()
            .await
            .deployments
            .get(&(namespace.to_string(), name.to_string()))
            .map(|d| d.replicas)
    }
}

impl Default for FakeCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterCapability for FakeCluster {
    fn delete_pod<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
        _grace_period_seconds: i64,
        _propagation: Propagation,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ClusterError>> + Send + 'a>> {
        Box::pin(async move {
            let mut s = self.inner.lock().await;
            let key = (namespace.to_string(), name.to_string());
            if s.pods.remove(&key).is_none() {
                return Err(ClusterError::PodNotFound(namespace.to_string(), name.to_string()));
            }
            s.deleted_pods.push(key);
            Ok(())
        })
    }

    fn get_deployment<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<DeploymentRef, ClusterError>> + Send + 'a>> {
        Box::pin(async move {
            let s = self.inner.lock().await;
            s.deployments
                .get(&(namespace.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| ClusterError::DeploymentNotFound(namespace.to_string(), name.to_string()))
        })
    }

    fn patch_deployment_replicas<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
        replicas: i32,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ClusterError>> + Send + 'a>> {
        Box::pin(async move {
            let mut s = self.inner.lock().await;
            let key = (namespace.to_string(), name.to_string());
            let d = s
                .deployments
                .get_mut(&key)
                .ok_or_else(|| ClusterError::DeploymentNotFound(namespace.to_string(), name.to_string()))?;
            d.replicas = replicas;
            Ok(())
        })
    }

    fn rollback_deployment<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ClusterError>> + Send + 'a>> {
        Box::pin(async move {
            let mut s = self.inner.lock().await;
            let key = (namespace.to_string(), name.to_string());
            let has_previous = s
                .deployments
                .get(&key)
                .ok_or_else(|| ClusterError::DeploymentNotFound(namespace.to_string(), name.to_string()))?
                .previous_template_hash
                .is_some();
            if !has_previous {
                return Err(ClusterError::RequestFailed(format!(
                    "no previous revision for {}/{}",
                    namespace, name
                )));
            }
            s.rollbacks.push(key);
            Ok(())
        })
    }

    fn get_replica_set<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<ReplicaSetRef, ClusterError>> + Send + 'a>> {
        Box::pin(async move {
            let s = self.inner.lock().await;
            s.replica_sets
                .get(&(namespace.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| ClusterError::ReplicaSetNotFound(namespace.to_string(), name.to_string()))
        })
    }

    fn list_replica_sets<'a>(
        &'a self,
        namespace: &'a str,
        _label_selector: Option<&'a str>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<ReplicaSetRef>, ClusterError>> + Send + 'a>> {
        Box::pin(async move {
            let s = self.inner.lock().await;
            Ok(s.replica_sets
                .values()
                .filter(|rs| rs.namespace == namespace)
                .cloned()
                .collect())
        })
    }

    fn get_pod<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<PodRef, ClusterError>> + Send + 'a>> {
        Box::pin(async move {
            let s = self.inner.lock().await;
            s.pods
                .get(&(namespace.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| ClusterError::PodNotFound(namespace.to_string(), name.to_string()))
        })
    }

    fn list_pods<'a>(
        &'a self,
        namespace: &'a str,
        _field_selector: Option<&'a str>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<PodRef>, ClusterError>> + Send + 'a>> {
        Box::pin(async move {
            let s = self.inner.lock().await;
            Ok(s.pods.values().filter(|p| p.namespace == namespace).cloned().collect())
        })
    }
}
