//! Response mapping.
//!
//! | Outcome        | Status | Body                                                  |
//! |----------------|--------|-------------------------------------------------------|
//! | malformed body | 400    | `{"error": <decode error>}`                           |
//! | timeout        | 504    | `{"error": "Payment gateway timed out"}`              |
//! | declined       | 402    | `{"error": "Payment declined by issuer"}`             |
//! | approved       | 200    | `{"success": true, "transaction_id", "message"}`      |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::payments::PaymentResponse;

pub const TIMEOUT_MESSAGE: &str = "Payment gateway timed out";
pub const DECLINED_MESSAGE: &str = "Payment declined by issuer";
pub const APPROVED_MESSAGE: &str = "Payment processed successfully";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ApprovedBody {
    pub success: bool,
    pub transaction_id: String,
    pub message: String,
}

/// 400 response for an undecodable body.
pub fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response()
}

impl IntoResponse for PaymentResponse {
    fn into_response(self) -> Response {
        match self {
            PaymentResponse::TimedOut => (
                StatusCode::GATEWAY_TIMEOUT,
                Json(ErrorBody {
                    error: TIMEOUT_MESSAGE.to_string(),
                }),
            )
                .into_response(),
            PaymentResponse::Declined => (
                StatusCode::PAYMENT_REQUIRED,
                Json(ErrorBody {
                    error: DECLINED_MESSAGE.to_string(),
                }),
            )
                .into_response(),
            PaymentResponse::Approved { transaction_id } => (
                StatusCode::OK,
                Json(ApprovedBody {
                    success: true,
                    transaction_id,
                    message: APPROVED_MESSAGE.to_string(),
                }),
            )
                .into_response(),
        }
    }
}
