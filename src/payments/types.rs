//! Payment request and response types.

use serde::{Deserialize, Serialize};

use crate::chaos::Outcome;

/// Inbound payment request.
///
/// Fields missing from the payload take their zero values; no semantic
/// validation is applied.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentRequest {
    pub order_id: i64,
    pub amount: f64,
    pub card_number: String,
}

/// Result of running a request through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentResponse {
    TimedOut,
    Declined,
    Approved { transaction_id: String },
}

impl PaymentResponse {
    pub fn outcome(&self) -> Outcome {
        match self {
            PaymentResponse::TimedOut => Outcome::Timeout,
            PaymentResponse::Declined => Outcome::Declined,
            PaymentResponse::Approved { .. } => Outcome::Approved,
        }
    }
}
