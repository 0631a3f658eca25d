//! Error types, split by the tiering in the module docs: recoverable
//! conditions never produce an `Err` (they become a result code on the
//! wire), fatal conditions do.

use thiserror::Error;

/// Tier-1 codec failure: the caller-provided buffer was too small for the
/// read or append being attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer exhausted: needed {needed} bytes at offset {offset}, capacity is {capacity}")]
    BufferExhausted {
        needed: usize,
        offset: usize,
        capacity: usize,
    },
}

/// Tier-3 fatal conditions. These halt processing of the current command
/// and are expected to be surfaced to the runtime rather than recovered
/// from within the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unrecognized order type byte {0}")]
    UnsupportedOrderType(u8),

    #[error("unrecognized action byte {0}")]
    InvalidActionByte(u8),

    #[error(
        "FOK_BUDGET order {order_id} passed its feasibility check but only filled {filled} of {wanted}"
    )]
    BudgetFillInvariantViolated {
        order_id: u64,
        wanted: u64,
        filled: u64,
    },

    #[error(transparent)]
    Codec(#[from] CodecError),
}
