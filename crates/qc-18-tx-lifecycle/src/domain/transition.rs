//! Transaction lifecycle state machine
//!
//! ```text
//! [PENDING] ──settle(block, outcome)──→ [SETTLED] ──finalize──→ [DONE]
//!     ↑                                     │
//!     └──────────── branch pruned ──────────┘
//! ```
//!
//! `DONE` is terminal. Every transition is a pure function of the current
//! state and the event, so the dispatcher only decides *when* to apply them.

use super::value_objects::{BlockHash, Outcome, Settlement};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a tracked transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TxState {
    /// Observed, fate not decided on any live branch
    #[default]
    Pending,
    /// Fate decided on a branch that is not final yet
    Settled(Settlement),
    /// Settling block finalized
    Done(Settlement),
}

impl TxState {
    pub fn name(&self) -> &'static str {
        match self {
            TxState::Pending => "pending",
            TxState::Settled(_) => "settled",
            TxState::Done(_) => "done",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, TxState::Pending)
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, TxState::Settled(_))
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TxState::Done(_))
    }

    /// Settlement recorded for this transaction, if any
    pub fn settlement(&self) -> Option<&Settlement> {
        match self {
            TxState::Pending => None,
            TxState::Settled(s) | TxState::Done(s) => Some(s),
        }
    }
}

/// Events that drive transaction state transitions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxEvent {
    /// A block decided the transaction's fate
    Settle(Settlement),
    /// The settling block became final
    Finalize,
    /// The settling block was pruned before becoming final
    BranchPruned,
}

impl TxEvent {
    pub fn target_name(&self) -> &'static str {
        match self {
            TxEvent::Settle(_) => "settled",
            TxEvent::Finalize => "done",
            TxEvent::BranchPruned => "pending",
        }
    }
}

/// Calculate the next state, or `None` when the event does not apply.
pub fn next_state(state: &TxState, event: TxEvent) -> Option<TxState> {
    match (state, event) {
        (TxState::Pending, TxEvent::Settle(settlement)) => Some(TxState::Settled(settlement)),
        (TxState::Settled(settlement), TxEvent::Finalize) => {
            Some(TxState::Done(settlement.clone()))
        }
        (TxState::Settled(_), TxEvent::BranchPruned) => Some(TxState::Pending),
        _ => None,
    }
}

/// Decide a pending transaction's fate against one block.
///
/// Inclusion wins: an included transaction is valid and only its success
/// flag is queried. Otherwise validity against the block is queried and a
/// valid-but-absent transaction stays pending. The predicates are only
/// invoked when their answer is needed.
pub fn decide<E, S, V>(
    block_hash: &BlockHash,
    included: bool,
    successful: S,
    valid: V,
) -> Result<Option<Settlement>, E>
where
    S: FnOnce() -> Result<bool, E>,
    V: FnOnce() -> Result<bool, E>,
{
    if included {
        let successful = successful()?;
        return Ok(Some(Settlement::new(
            block_hash.clone(),
            Outcome::Valid { successful },
        )));
    }

    if !valid()? {
        return Ok(Some(Settlement::invalid(block_hash.clone())));
    }

    Ok(None)
}
