//! Chaos scenario tags.

use std::fmt;

/// Header carrying the requested chaos scenario.
pub const X_CHAOS_SCENARIO: &str = "x-chaos-scenario";

/// Scenario requested by the caller for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ChaosScenario {
    /// No header: no chaos requested.
    #[default]
    None,
    PaymentTimeout,
    BlackFriday,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl ChaosScenario {
    /// Interpret the raw header value. Tags are matched exactly.
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            None => ChaosScenario::None,
            Some("payment-timeout") => ChaosScenario::PaymentTimeout,
            Some("black-friday") => ChaosScenario::BlackFriday,
            Some(other) => ChaosScenario::Other(other.to_string()),
        }
    }

    /// Tag as it appeared on the wire; empty when absent.
    pub fn tag(&self) -> &str {
        match self {
            ChaosScenario::None => "",
            ChaosScenario::PaymentTimeout => "payment-timeout",
            ChaosScenario::BlackFriday => "black-friday",
            ChaosScenario::Other(tag) => tag,
        }
    }

    /// Label for metrics; unknown tags collapse to a single bucket.
    pub fn metric_label(&self) -> &'static str {
        match self {
            ChaosScenario::None => "none",
            ChaosScenario::PaymentTimeout => "payment-timeout",
            ChaosScenario::BlackFriday => "black-friday",
            ChaosScenario::Other(_) => "other",
        }
    }
}

impl fmt::Display for ChaosScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChaosScenario::None => f.write_str("none"),
            other => f.write_str(other.tag()),
        }
    }
}
