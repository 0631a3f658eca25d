//! Core matching engine for one trading symbol: binary command dispatch,
//! price-time-priority matching, resting-book maintenance, and deterministic
//! state hashing.
//!
//! The engine owns no I/O: callers hand it a request buffer and offset plus
//! a response buffer and offset via [`commands::dispatch`], and read the
//! result back out of the response bytes it appends. A surrounding runtime
//! is expected to multiplex many of these engines across symbols, persist
//! state, authenticate users, and route commands — none of that is this
//! crate's concern.
//!
//! ```
//! use limit_engine_core::prelude::*;
//!
//! let engine = MatchingEngine::new(SymbolSpec::new("XYZ", false));
//! let mut request = vec![CommandOpcode::Place as u8];
//! request.extend(1u64.to_be_bytes()); // uid
//! request.extend(100u64.to_be_bytes()); // order_id
//! request.extend(1000i64.to_be_bytes()); // price
//! request.extend(0i64.to_be_bytes()); // reserve_bid_price
//! request.extend(10i64.to_be_bytes()); // size
//! request.extend(0u32.to_be_bytes()); // user_cookie
//! request.push(Action::Ask as u8);
//! request.push(OrderKind::Gtc as u8);
//!
//! let mut response = [0u8; 64];
//! let end = dispatch(&engine, &request, 0, 0, &mut response, 0).unwrap();
//! assert!(end > 0);
//! ```

pub mod book;
pub mod buffer;
pub mod commands;
pub mod constants;
pub mod error;
pub mod events;
pub mod matching;
pub mod model;
pub mod price_level;
pub mod snapshot;
pub mod symbol;

pub mod prelude {
    //! Commonly imported surface for crates embedding this engine.
    pub use crate::book::MatchingEngine;
    pub use crate::commands::dispatch;
    pub use crate::constants::{Action, CommandOpcode, OrderKind, ResultCode, ResultFlags};
    pub use crate::error::{CodecError, EngineError};
    pub use crate::model::{OrderLocation, RestingOrder, TradeFill};
    pub use crate::snapshot::{OrderBookSnapshot, OrderBookSnapshotPackage};
    pub use crate::symbol::SymbolSpec;
}
