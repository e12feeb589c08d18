use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Extension, Json,
};
use opentelemetry::trace::SpanContext;
use serde_json::{json, Value};

use crate::chaos::{ChaosScenario, X_CHAOS_SCENARIO};
use crate::http::response::bad_request;
use crate::http::server::AppState;
use crate::payments::PaymentRequest;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Decode a payment body regardless of its `Content-Type`. A JSON `null`
/// is the all-defaults request.
fn decode_payment(body: &[u8]) -> Result<PaymentRequest, serde_json::Error> {
    serde_json::from_slice::<Option<PaymentRequest>>(body).map(Option::unwrap_or_default)
}

/// `POST /payment/process`.
///
/// Bodies that cannot be read or are not a JSON payment object (bad syntax,
/// wrong types, oversized) are answered with 400.
pub async fn process_payment(
    State(state): State<AppState>,
    span: Option<Extension<SpanContext>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let ctx = span
        .map(|Extension(ctx)| ctx)
        .unwrap_or_else(SpanContext::empty_context);

    let decoded = body
        .map_err(|rejection| rejection.body_text())
        .and_then(|bytes| decode_payment(&bytes).map_err(|e| e.to_string()));
    let request = match decoded {
        Ok(request) => request,
        Err(error) => {
            tracing::warn!(error = %error, "Rejected malformed payment request");
            state.pipeline.reject_malformed(&ctx, &error);
            return bad_request(error);
        }
    };

    let scenario = ChaosScenario::from_header(
        headers
            .get(X_CHAOS_SCENARIO)
            .and_then(|v| v.to_str().ok()),
    );

    state
        .pipeline
        .process(&ctx, &scenario, &request)
        .await
        .into_response()
}
