use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::timestamp::millis;

/// Previously observed active-resource snapshot for one cluster key.
///
/// Single-writer-per-key: only the cluster's own task run may read or write
/// its entry. Every run replaces the three id sets wholesale with the sets
/// computed from the current listing; there is no union with the old state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveInstanceCache {
    pub active_vm_ids: BTreeSet<String>,
    pub active_host_arns: BTreeSet<String>,
    pub active_task_arns: BTreeSet<String>,
    /// End of the last fully processed diff window.
    #[serde(with = "millis")]
    pub last_processed: SystemTime,
    /// Hour boundary through which utilization metrics were collected.
    #[serde(with = "millis")]
    pub metrics_collected_till_hour: SystemTime,
}

impl Default for ActiveInstanceCache {
    /// Cold-start entry: both watermarks sit at the far past so the first
    /// run treats every currently running resource as newly started.
    fn default() -> Self {
        Self {
            active_vm_ids: BTreeSet::new(),
            active_host_arns: BTreeSet::new(),
            active_task_arns: BTreeSet::new(),
            last_processed: UNIX_EPOCH,
            metrics_collected_till_hour: UNIX_EPOCH,
        }
    }
}
