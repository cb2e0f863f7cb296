//! Domain model: transient parse results, aggregated store records, rules.

pub mod error_record;
pub mod rule;

pub use error_record::{
    LogEntry, MatchedError, ParsedError, RemediationLog, RemediationStatus, Stats, StoredError,
};
pub use rule::{LabelMatch, MatchSpec, NamespaceMatch, Priority, RemediationSpec, Rule};
