//! Outgoing lifecycle notifications
//!
//! The sink port receives these as plain calls; this record form is what
//! recording sinks and the replay tool store and compare.

use crate::domain::{Settlement, TxId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Settled,
    Done,
}

/// One emitted notification
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxNotification {
    pub kind: NotificationKind,
    pub tx_id: TxId,
    pub settlement: Settlement,
}

impl TxNotification {
    pub fn settled(tx_id: TxId, settlement: Settlement) -> Self {
        Self {
            kind: NotificationKind::Settled,
            tx_id,
            settlement,
        }
    }

    pub fn done(tx_id: TxId, settlement: Settlement) -> Self {
        Self {
            kind: NotificationKind::Done,
            tx_id,
            settlement,
        }
    }
}
