//! Message and pod-name normalization, and fingerprint computation.
//!
//! Fingerprints collapse repeat occurrences of "the same" error across
//! replicas and across time-varying noise (timestamps, UUIDs, IDs) so the
//! store can aggregate them under one entry.

pub mod fingerprint;
pub mod message;
pub mod podname;

pub use fingerprint::fingerprint;
pub use message::extract_message;
pub use podname::pod_base;
