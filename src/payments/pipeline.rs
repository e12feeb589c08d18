//! Chaos-aware payment pipeline.
//!
//! # Responsibilities
//! - Log the start of processing against the request's span
//! - Ask the chaos engine for an outcome
//! - Perform the outcome's side effect (hold, reject, or simulate work)
//! - Log the outcome and build the response
//!
//! # Design Decisions
//! - The span context is an explicit, read-only argument, never ambient state
//! - Delays suspend only the calling task (`tokio::time::sleep`)
//! - Telemetry is best-effort; nothing here depends on it succeeding

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::trace::SpanContext;
use tokio::time::sleep;

use crate::chaos::{ChaosEngine, ChaosScenario, Outcome, RandomSource, SeededRng, ThreadRng};
use crate::config::ChaosConfig;
use crate::observability::metrics;
use crate::payments::transaction::{transaction_id, Clock, SystemClock};
use crate::payments::types::{PaymentRequest, PaymentResponse};
use crate::telemetry::{Emitter, KeyValue};

/// Position of a request in the processing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Decided(Outcome),
    TimingOut,
    Processing,
    Responded(Outcome),
}

impl Stage {
    /// Whether `next` may follow `self`.
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Stage::Received, Stage::Decided(_))
                | (Stage::Decided(Outcome::Timeout), Stage::TimingOut)
                | (Stage::Decided(Outcome::Declined), Stage::Responded(Outcome::Declined))
                | (Stage::Decided(Outcome::Approved), Stage::Processing)
                | (Stage::TimingOut, Stage::Responded(Outcome::Timeout))
                | (Stage::Processing, Stage::Responded(Outcome::Approved))
        )
    }
}

/// Stages one request went through, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journey {
    stages: Vec<Stage>,
}

impl Journey {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    fn enter(&mut self, ctx: &SpanContext, stage: Stage) {
        let from = self.stages.last().copied();
        let legal = match from {
            Some(from) => from.can_advance_to(stage),
            None => stage == Stage::Received,
        };
        debug_assert!(legal, "illegal payment stage transition {from:?} -> {stage:?}");
        tracing::debug!(
            trace_id = %ctx.trace_id(),
            from = ?from,
            to = ?stage,
            "Payment stage"
        );
        self.stages.push(stage);
    }
}

fn millis(delay: Duration) -> i64 {
    i64::try_from(delay.as_millis()).unwrap_or(i64::MAX)
}

/// Runs payment requests through chaos decision and outcome handling.
pub struct PaymentPipeline {
    engine: ChaosEngine,
    rng: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    emitter: Emitter,
}

impl PaymentPipeline {
    pub fn new(
        engine: ChaosEngine,
        rng: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
        emitter: Emitter,
    ) -> Self {
        Self {
            engine,
            rng,
            clock,
            emitter,
        }
    }

    /// Pipeline with a seeded RNG when `config.seed` is set, thread-local
    /// RNGs otherwise, and the system clock.
    pub fn from_config(config: &ChaosConfig, emitter: Emitter) -> Self {
        let rng: Arc<dyn RandomSource> = match config.seed {
            Some(seed) => {
                tracing::info!(seed, "Using seeded chaos RNG");
                Arc::new(SeededRng::new(seed))
            }
            None => Arc::new(ThreadRng),
        };
        Self::new(ChaosEngine::new(config), rng, Arc::new(SystemClock), emitter)
    }

    /// Process one decoded request within the span `ctx`.
    pub async fn process(
        &self,
        ctx: &SpanContext,
        scenario: &ChaosScenario,
        request: &PaymentRequest,
    ) -> PaymentResponse {
        self.process_with_journey(ctx, scenario, request).await.0
    }

    /// Like [`process`](Self::process), also returning the stages walked.
    pub async fn process_with_journey(
        &self,
        ctx: &SpanContext,
        scenario: &ChaosScenario,
        request: &PaymentRequest,
    ) -> (PaymentResponse, Journey) {
        let mut journey = Journey::default();
        journey.enter(ctx, Stage::Received);
        self.emitter.info(
            ctx,
            format!("Processing payment for Order {}", request.order_id),
            [
                KeyValue::new("order.id", request.order_id),
                KeyValue::new("amount", request.amount),
                KeyValue::new("chaos.scenario", scenario.tag().to_string()),
            ],
        );

        let outcome = self
            .engine
            .decide(scenario, &request.card_number, self.rng.as_ref());
        journey.enter(ctx, Stage::Decided(outcome));
        metrics::record_outcome(outcome.as_str(), scenario.metric_label());

        let response = match outcome {
            Outcome::Timeout => {
                let delay = self.engine.timeout_delay();
                self.emitter.warn(
                    ctx,
                    "Simulating payment gateway timeout",
                    [
                        KeyValue::new("order.id", request.order_id),
                        KeyValue::new("chaos.scenario", scenario.tag().to_string()),
                        KeyValue::new("payment.outcome", outcome.as_str()),
                        KeyValue::new("delay_ms", millis(delay)),
                    ],
                );
                journey.enter(ctx, Stage::TimingOut);
                sleep(delay).await;
                PaymentResponse::TimedOut
            }
            Outcome::Declined => {
                self.emitter.warn(
                    ctx,
                    format!(
                        "Payment declined for card ending in {}",
                        self.engine.decline_suffix()
                    ),
                    [
                        KeyValue::new("order.id", request.order_id),
                        KeyValue::new("payment.outcome", outcome.as_str()),
                    ],
                );
                PaymentResponse::Declined
            }
            Outcome::Approved => {
                let delay = self.engine.processing_delay(self.rng.as_ref());
                journey.enter(ctx, Stage::Processing);
                sleep(delay).await;

                let transaction_id = transaction_id(request.order_id, self.clock.unix_seconds());
                self.emitter.info(
                    ctx,
                    format!("Payment successful for Order {}", request.order_id),
                    [
                        KeyValue::new("order.id", request.order_id),
                        KeyValue::new("payment.outcome", outcome.as_str()),
                        KeyValue::new("transaction.id", transaction_id.clone()),
                        KeyValue::new("delay_ms", millis(delay)),
                    ],
                );
                PaymentResponse::Approved { transaction_id }
            }
        };

        journey.enter(ctx, Stage::Responded(outcome));
        (response, journey)
    }

    /// Record a request whose body could not be decoded.
    pub fn reject_malformed(&self, ctx: &SpanContext, error: &str) {
        self.emitter.error(
            ctx,
            format!("Invalid request: {}", error),
            [KeyValue::new("error", error.to_string())],
        );
    }
}
