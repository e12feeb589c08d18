//! Transaction identifiers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Wall clock used to stamp transactions.
pub trait Clock: Send + Sync {
    fn unix_seconds(&self) -> u64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// `txn_<order_id>_<unix_seconds>`.
pub fn transaction_id(order_id: i64, unix_seconds: u64) -> String {
    format!("txn_{}_{}", order_id, unix_seconds)
}
