//! Observer events broadcast to subscribers.

use crate::model::{RemediationLog, Stats, StoredError};

#[derive(Debug, Clone)]
pub enum ObserverEvent {
    NewError(StoredError),
    NewRemediation(RemediationLog),
    StatsUpdated(Stats),
}
