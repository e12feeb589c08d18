//! Chaos decision engine.
//!
//! # Rules (first match wins)
//! 1. Timeout: scenario is timeout-armed and one sample `< timeout_probability`
//! 2. Decline: card number ends with the decline suffix
//! 3. Approve
//!
//! A timeout-armed request with a declined card draws once; only when the
//! draw misses does the decline rule get a chance.

use std::fmt;
use std::time::Duration;

use crate::chaos::random::RandomSource;
use crate::chaos::scenario::ChaosScenario;
use crate::config::ChaosConfig;

/// Terminal result of the chaos decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Timeout,
    Declined,
    Approved,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Timeout => "timeout",
            Outcome::Declined => "declined",
            Outcome::Approved => "approved",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides outcomes and simulated latencies.
#[derive(Debug, Clone)]
pub struct ChaosEngine {
    timeout_probability: f64,
    timeout_scenarios: Vec<String>,
    decline_suffix: String,
    timeout_delay: Duration,
    processing_delay_ms: (u64, u64),
}

impl ChaosEngine {
    pub fn new(config: &ChaosConfig) -> Self {
        Self {
            timeout_probability: config.timeout_probability,
            timeout_scenarios: config.timeout_scenarios.clone(),
            decline_suffix: config.decline_suffix.clone(),
            timeout_delay: Duration::from_millis(config.timeout_delay_ms),
            processing_delay_ms: (config.processing_delay_min_ms, config.processing_delay_max_ms),
        }
    }

    /// Whether `scenario` arms the timeout rule.
    pub fn is_timeout_scenario(&self, scenario: &ChaosScenario) -> bool {
        !matches!(scenario, ChaosScenario::None)
            && self.timeout_scenarios.iter().any(|s| s == scenario.tag())
    }

    /// Card number suffix the issuer declines.
    pub fn decline_suffix(&self) -> &str {
        &self.decline_suffix
    }

    /// Whether the issuer declines `card_number`.
    pub fn is_declined_card(&self, card_number: &str) -> bool {
        card_number.len() >= self.decline_suffix.len() && card_number.ends_with(&self.decline_suffix)
    }

    /// Pick the outcome for one request. Never fails.
    ///
    /// Draws from `rng` only when the scenario arms the timeout rule.
    pub fn decide(&self, scenario: &ChaosScenario, card_number: &str, rng: &dyn RandomSource) -> Outcome {
        if self.is_timeout_scenario(scenario) && rng.next_f64() < self.timeout_probability {
            return Outcome::Timeout;
        }

        if self.is_declined_card(card_number) {
            return Outcome::Declined;
        }

        Outcome::Approved
    }

    /// How long a simulated gateway timeout holds the request.
    pub fn timeout_delay(&self) -> Duration {
        self.timeout_delay
    }

    /// Simulated processing latency, uniform in `[min, max)` milliseconds.
    pub fn processing_delay(&self, rng: &dyn RandomSource) -> Duration {
        let (low, high) = self.processing_delay_ms;
        Duration::from_millis(rng.range_u64(low, high))
    }
}

impl Default for ChaosEngine {
    fn default() -> Self {
        Self::new(&ChaosConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chaos::random::{FixedRandom, SeededRng};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const APPROVED_CARD: &str = "4111111111111111";
    const DECLINED_CARD: &str = "4111111111111100";

    /// Counts draws so tests can tell whether the engine consulted it.
    struct CountingRandom {
        sample: f64,
        draws: AtomicUsize,
    }

    impl RandomSource for CountingRandom {
        fn next_f64(&self) -> f64 {
            self.draws.fetch_add(1, Ordering::SeqCst);
            self.sample
        }

        fn range_u64(&self, low: u64, _high: u64) -> u64 {
            low
        }
    }

    fn all_scenarios() -> Vec<ChaosScenario> {
        vec![
            ChaosScenario::None,
            ChaosScenario::PaymentTimeout,
            ChaosScenario::BlackFriday,
            ChaosScenario::Other("flash-sale".into()),
        ]
    }

    #[test]
    fn test_plain_request_is_approved() {
        let engine = ChaosEngine::default();
        let rng = FixedRandom(0.0);
        assert_eq!(engine.decide(&ChaosScenario::None, APPROVED_CARD, &rng), Outcome::Approved);
        assert_eq!(
            engine.decide(&ChaosScenario::Other("flash-sale".into()), APPROVED_CARD, &rng),
            Outcome::Approved
        );
    }

    #[test]
    fn test_card_ending_in_00_is_declined_without_chaos() {
        let engine = ChaosEngine::default();
        for card in [DECLINED_CARD, "00", "100"] {
            assert_eq!(
                engine.decide(&ChaosScenario::None, card, &FixedRandom(0.0)),
                Outcome::Declined,
                "card {card}"
            );
        }
    }

    #[test]
    fn test_short_and_empty_cards_are_approved() {
        let engine = ChaosEngine::default();
        for card in ["", "0", "01", "4111111111111110"] {
            assert_eq!(
                engine.decide(&ChaosScenario::None, card, &FixedRandom(0.0)),
                Outcome::Approved,
                "card {card:?}"
            );
        }
    }

    #[test]
    fn test_timeout_scenarios_time_out_on_low_draw() {
        let engine = ChaosEngine::default();
        for scenario in [ChaosScenario::PaymentTimeout, ChaosScenario::BlackFriday] {
            assert_eq!(engine.decide(&scenario, APPROVED_CARD, &FixedRandom(0.0)), Outcome::Timeout);
            assert_eq!(engine.decide(&scenario, APPROVED_CARD, &FixedRandom(0.29)), Outcome::Timeout);
        }
    }

    #[test]
    fn test_high_draw_falls_through() {
        let engine = ChaosEngine::default();
        let rng = FixedRandom(0.99);
        assert_eq!(engine.decide(&ChaosScenario::BlackFriday, APPROVED_CARD, &rng), Outcome::Approved);
        assert_eq!(engine.decide(&ChaosScenario::BlackFriday, DECLINED_CARD, &rng), Outcome::Declined);
        // Threshold is exclusive.
        assert_eq!(
            engine.decide(&ChaosScenario::PaymentTimeout, APPROVED_CARD, &FixedRandom(0.3)),
            Outcome::Approved
        );
    }

    #[test]
    fn test_timeout_checked_before_decline() {
        let engine = ChaosEngine::default();
        assert_eq!(
            engine.decide(&ChaosScenario::PaymentTimeout, DECLINED_CARD, &FixedRandom(0.0)),
            Outcome::Timeout
        );
    }

    #[test]
    fn test_draws_only_for_armed_scenarios() {
        let engine = ChaosEngine::default();
        for scenario in all_scenarios() {
            let rng = CountingRandom {
                sample: 0.5,
                draws: AtomicUsize::new(0),
            };
            engine.decide(&scenario, APPROVED_CARD, &rng);
            let expected = usize::from(engine.is_timeout_scenario(&scenario));
            assert_eq!(rng.draws.load(Ordering::SeqCst), expected, "{scenario}");
        }
    }

    #[test]
    fn test_configured_scenarios_and_suffix() {
        let engine = ChaosEngine::new(&ChaosConfig {
            timeout_scenarios: vec!["flash-sale".into()],
            decline_suffix: "13".into(),
            ..ChaosConfig::default()
        });
        let rng = FixedRandom(0.0);
        assert_eq!(
            engine.decide(&ChaosScenario::Other("flash-sale".into()), APPROVED_CARD, &rng),
            Outcome::Timeout
        );
        assert_eq!(engine.decide(&ChaosScenario::BlackFriday, DECLINED_CARD, &rng), Outcome::Approved);
        assert_eq!(engine.decide(&ChaosScenario::None, "4111111111111113", &rng), Outcome::Declined);
    }

    #[test]
    fn test_observed_timeout_rate_near_probability() {
        let engine = ChaosEngine::default();
        let rng = SeededRng::new(7);
        let trials = 10_000;
        let timeouts = (0..trials)
            .filter(|_| engine.decide(&ChaosScenario::BlackFriday, APPROVED_CARD, &rng) == Outcome::Timeout)
            .count();
        let rate = timeouts as f64 / trials as f64;
        assert!((0.27..0.33).contains(&rate), "rate {rate}");
    }

    #[test]
    fn test_processing_delay_bounds() {
        let engine = ChaosEngine::default();
        assert_eq!(engine.processing_delay(&FixedRandom(0.0)), Duration::from_millis(100));
        assert_eq!(engine.processing_delay(&FixedRandom(1.0)), Duration::from_millis(599));
        assert_eq!(engine.timeout_delay(), Duration::from_secs(5));
    }
}
