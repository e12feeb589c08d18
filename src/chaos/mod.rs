//! Chaos decision subsystem.
//!
//! # Data Flow
//! ```text
//! X-Chaos-Scenario header → scenario.rs (ChaosScenario)
//! PaymentRequest.card_number ─┐
//! random.rs (RandomSource) ───┼→ engine.rs (ChaosEngine::decide) → Outcome
//! ChaosScenario ──────────────┘
//! ```
//!
//! # Design Decisions
//! - The engine is pure: it decides, the payment pipeline acts
//! - Randomness is injected so decisions are reproducible under test
//! - The timeout rule is checked strictly before the decline rule

pub mod engine;
pub mod random;
pub mod scenario;

pub use engine::{ChaosEngine, Outcome};
pub use random::{FixedRandom, RandomSource, SeededRng, ThreadRng};
pub use scenario::{ChaosScenario, X_CHAOS_SCENARIO};
