//! Events module for the Transaction Lifecycle subsystem

pub mod incoming;
pub mod outgoing;

pub use incoming::ChainEvent;
pub use outgoing::{NotificationKind, TxNotification};
