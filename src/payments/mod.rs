//! Payment processing pipeline.
//!
//! # State Machine (per request, never persisted)
//! ```text
//! Received → Decided ─┬→ TimingOut  → Responded(Timeout)
//!                     ├→ Responded(Declined)
//!                     └→ Processing → Responded(Approved)
//! ```

pub mod pipeline;
pub mod transaction;
pub mod types;

pub use pipeline::{Journey, PaymentPipeline, Stage};
pub use transaction::{transaction_id, Clock, SystemClock};
pub use types::{PaymentRequest, PaymentResponse};
