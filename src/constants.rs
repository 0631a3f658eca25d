//! Wire-level enumerations: command opcodes, order types, order actions
//! and result codes. Byte encodings are part of the wire contract and must
//! not be renumbered without a compatibility note.

use bitflags::bitflags;
use serde::Serialize;

/// Top-level command opcode, the first byte of every request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandOpcode {
    /// Place a new order (GTC/IOC/IOC_BUDGET/FOK/FOK_BUDGET).
    Place = 1,
    /// Cancel a resting order.
    Cancel = 2,
    /// Move (reprice) a resting order.
    Move = 3,
    /// Reduce the size of a resting order.
    Reduce = 4,
    /// Request an aggregated L2 snapshot.
    QueryOrderBook = 5,
}

impl TryFrom<u8> for CommandOpcode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Place),
            2 => Ok(Self::Cancel),
            3 => Ok(Self::Move),
            4 => Ok(Self::Reduce),
            5 => Ok(Self::QueryOrderBook),
            other => Err(other),
        }
    }
}

/// Order-type byte carried in a PLACE request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OrderKind {
    /// Good-Till-Cancel: rest any unmatched remainder.
    Gtc = 0,
    /// Immediate-Or-Cancel, price cap: never rest.
    Ioc = 1,
    /// Immediate-Or-Cancel, total-notional cap: never rest.
    IocBudget = 2,
    /// Fill-Or-Kill, price cap: match fully or not at all.
    Fok = 3,
    /// Fill-Or-Kill, total-notional cap: match fully or not at all.
    FokBudget = 4,
}

impl TryFrom<u8> for OrderKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Gtc),
            1 => Ok(Self::Ioc),
            2 => Ok(Self::IocBudget),
            3 => Ok(Self::Fok),
            4 => Ok(Self::FokBudget),
            other => Err(other),
        }
    }
}

/// Which side of the book an order rests on or a taker arrives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Action {
    /// Sell order.
    Ask = 0,
    /// Buy order.
    Bid = 1,
}

impl Action {
    /// The opposite side, i.e. the side a taker of this action matches against.
    pub fn opposite(self) -> Action {
        match self {
            Action::Ask => Action::Bid,
            Action::Bid => Action::Ask,
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ask),
            1 => Ok(Self::Bid),
            other => Err(other),
        }
    }
}

/// Low 12 bits of the packed trailing result word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ResultCode {
    /// Command applied successfully.
    Success = 0,
    /// `order_id` (with the given `uid`) is not a currently resting order.
    UnknownOrderId = 1,
    /// The command opcode byte was not recognized.
    UnsupportedCommand = 2,
    /// Reserved for multi-book routing; unused by a single-symbol core.
    InvalidOrderBookId = 3,
    /// PLACE with `size <= 0`, or a size/price failing `SymbolSpec` validation.
    IncorrectOrderSize = 4,
    /// REDUCE with a non-positive requested size.
    IncorrectReduceSize = 5,
    /// MOVE of a BID above `reserve_bid_price` on an exchange-type symbol.
    MoveFailedPriceOverRiskLimit = 6,
    /// Reserved; unsupported order types are a fatal `EngineError`, not a
    /// result code, but the value is kept for wire-format completeness.
    UnsupportedOrderType = 7,
    /// The L2 query limit could not be honored (response would overflow
    /// the caller's output buffer).
    IncorrectL2SizeLimit = 8,
}

impl ResultCode {
    /// Numeric value occupying bits `[0..12)` of the packed result word.
    pub fn code(self) -> u16 {
        self as u16
    }
}

bitflags! {
    /// Bits `[12..16)` of the packed trailing result word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResultFlags: u16 {
        /// The taker side of the command is fully resolved (filled, rejected,
        /// cancelled, or fully reduced) and nothing from it rests afterward.
        const TAKER_COMPLETED = 1 << 12;
        /// The taker's own action was BID (set on CANCEL so the caller can
        /// tell which side was removed without re-reading the request).
        const TAKER_IS_BID = 1 << 13;
        /// A reduce event is present in the response body.
        const REDUCE_PRESENT = 1 << 14;
    }
}

/// Packs a [`ResultCode`] and [`ResultFlags`] into the 16-bit trailing word.
pub fn pack_result(code: ResultCode, flags: ResultFlags) -> u16 {
    code.code() | flags.bits()
}

/// Byte widths of the fixed request layouts, for bounds checks in dispatch.
pub mod request_len {
    /// `uid:8 | order_id:8 | price:8 | reserve_bid_price:8 | size:8 | user_cookie:4 | action:1 | type:1`
    pub const PLACE: usize = 46;
    /// `uid:8 | order_id:8`
    pub const CANCEL: usize = 16;
    /// `uid:8 | order_id:8 | size:8`
    pub const REDUCE: usize = 24;
    /// `uid:8 | order_id:8 | price:8`
    pub const MOVE: usize = 24;
    /// `limit:2`
    pub const QUERY_ORDER_BOOK: usize = 2;
}
