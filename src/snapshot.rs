//! Serializable snapshots of book state, for test fixtures and for
//! debugging tooling that sits outside the binary wire protocol.
//!
//! This is purely an ambient convenience: nothing on the hot command path
//! touches `serde`. Grounded on `orderbook-rs`'s `OrderBookSnapshot` /
//! `OrderBookSnapshotPackage`, including the `sha2`-backed checksum wrapper
//! used to detect accidental tampering or corruption of a persisted
//! snapshot file.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::book::MatchingEngine;

/// One aggregated depth row, the serializable counterpart of the L2 wire record.
#[derive(Debug, Clone, Serialize)]
pub struct LevelSnapshot {
    pub price: i64,
    pub volume: u64,
    pub num_orders: u32,
}

/// A point-in-time view of both book sides plus the deterministic state hash.
#[derive(Debug, Clone, Serialize)]
pub struct OrderBookSnapshot {
    pub symbol: String,
    pub asks: Vec<LevelSnapshot>,
    pub bids: Vec<LevelSnapshot>,
    pub state_hash: i64,
}

impl OrderBookSnapshot {
    pub fn capture(engine: &MatchingEngine) -> Self {
        let to_levels = |rows: Vec<(i64, u64, u32)>| {
            rows.into_iter()
                .map(|(price, volume, num_orders)| LevelSnapshot {
                    price,
                    volume,
                    num_orders,
                })
                .collect()
        };
        Self {
            symbol: engine.symbol().name().to_string(),
            asks: to_levels(engine.fill_asks(None)),
            bids: to_levels(engine.fill_bids(None)),
            state_hash: engine.state_hash(),
        }
    }
}

/// An [`OrderBookSnapshot`] plus a SHA-256 checksum of its canonical JSON
/// encoding, so a persisted snapshot file can be verified before reuse.
#[derive(Debug, Clone, Serialize)]
pub struct OrderBookSnapshotPackage {
    pub snapshot: OrderBookSnapshot,
    pub checksum: String,
}

impl OrderBookSnapshotPackage {
    pub fn build(engine: &MatchingEngine) -> Result<Self, serde_json::Error> {
        let snapshot = OrderBookSnapshot::capture(engine);
        let checksum = compute_checksum(&snapshot)?;
        Ok(Self { snapshot, checksum })
    }
}

fn compute_checksum(snapshot: &OrderBookSnapshot) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_vec(snapshot)?;
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(format!("{:x}", hasher.finalize()))
}
