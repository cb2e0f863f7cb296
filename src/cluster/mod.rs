//! Cluster capability — abstract interface to the orchestration control plane.
//!
//! `capability.rs` defines the trait; `fake.rs` provides the test double
//! used by the action tests and the end-to-end scenarios. No live binding
//! is shipped here: the cluster client is an external collaborator.

pub mod capability;
pub mod fake;

pub use capability::{
    resolve_deployment, ClusterCapability, ClusterError, DeploymentRef, PodRef, Propagation,
    ReplicaSetRef,
};
pub use fake::FakeCluster;
