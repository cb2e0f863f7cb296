//! Cluster capability — abstract interface over the orchestration control plane.
//!
//! Consumers (the action registry) never see a concrete client; `fake.rs`
//! provides the test double used throughout the test suite.

use std::pin::Pin;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("pod not found: {0}/{1}")]
    PodNotFound(String, String),
    #[error("deployment not found: {0}/{1}")]
    DeploymentNotFound(String, String),
    #[error("replica set not found: {0}/{1}")]
    ReplicaSetNotFound(String, String),
    #[error("pod {0}/{1} has no owning replica set")]
    NoOwner(String, String),
    #[error("replica set {0}/{1} has no owning deployment")]
    OrphanReplicaSet(String, String),
    #[error("cluster request failed: {0}")]
    RequestFailed(String),
}

#[derive(Debug, Clone)]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
    pub phase: String,
    pub deletion_timestamp: Option<String>,
    pub owner_replica_set: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReplicaSetRef {
    pub namespace: String,
    pub name: String,
    pub owner_deployment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeploymentRef {
    pub namespace: String,
    pub name: String,
    pub replicas: i32,
    pub previous_template_hash: Option<String>,
}

/// Propagation policy for a delete, mirroring the usual cluster API options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Foreground,
    Background,
    Orphan,
}

/// Unified async interface over the cluster control plane.
///
/// Object-safe thanks to `Pin<Box<…>>` returns. Implementations must be
/// `Send + Sync`.
pub trait ClusterCapability: Send + Sync {
    fn delete_pod<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
        grace_period_seconds: i64,
        propagation: Propagation,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ClusterError>> + Send + 'a>>;

    fn get_deployment<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<DeploymentRef, ClusterError>> + Send + 'a>>;

    fn patch_deployment_replicas<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
        replicas: i32,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ClusterError>> + Send + 'a>>;

    fn rollback_deployment<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<(), ClusterError>> + Send + 'a>>;

    fn get_replica_set<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<ReplicaSetRef, ClusterError>> + Send + 'a>>;

    fn list_replica_sets<'a>(
        &'a self,
        namespace: &'a str,
        label_selector: Option<&'a str>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<ReplicaSetRef>, ClusterError>> + Send + 'a>>;

    fn get_pod<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<PodRef, ClusterError>> + Send + 'a>>;

    fn list_pods<'a>(
        &'a self,
        namespace: &'a str,
        field_selector: Option<&'a str>,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<PodRef>, ClusterError>> + Send + 'a>>;
}

/// Resolve the owning deployment of a pod through its owner chain
/// (pod → replica set → deployment).
pub async fn resolve_deployment(
    cluster: &(dyn ClusterCapability),
    namespace: &str,
    pod_name: &str,
) -> Result<String, ClusterError> {
    let pod = cluster.get_pod(namespace, pod_name).await?;
    let rs_name = pod
        .owner_replica_set
        .ok_or_else(|| ClusterError::NoOwner(namespace.to_string(), pod_name.to_string()))?;
    let rs = cluster.get_replica_set(namespace, &rs_name).await?;
    rs.owner_deployment
        .ok_or_else(|| ClusterError::OrphanReplicaSet(namespace.to_string(), rs_name))
}
