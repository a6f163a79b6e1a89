use axum::{
	body::Bytes,
	extract::State,
	routing::{get, post},
	Json, Router,
};
use hyper::StatusCode;
use log::error;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::payment_gateway::{
	callback::{parse_callback, record_outcome},
	mpesa_payment_gateway::{MpesaPaymentProcessor, PaymentDetails},
};

#[derive(Clone)]
pub struct AppState {
	pub processor: MpesaPaymentProcessor,
}

pub fn app(state: AppState) -> Router {
	Router::new()
		.route("/initiate", post(initiate))
		.route("/stk-callback", post(stk_callback))
		.route("/callback", post(stk_callback))
		.route("/health", get(health))
		.layer(CorsLayer::permissive())
		.with_state(state)
}

pub async fn initiate(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
	let details = PaymentDetails::from_body(&body);

	match state.processor.handle_payment(details).await {
		Ok(data) => (
			StatusCode::OK,
			Json(json!({
				"success": true,
				"message": "STK Push initiated successfully",
				"data": data,
			})),
		),
		Err(e) => {
			if e.is_auth_error() {
				error!("STK push aborted, no access token: {}", e);
			} else {
				error!("STK push failed: {}", e);
			}
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(json!({
					"success": false,
					"error": "Failed to initiate STK push",
					"details": e.to_string(),
				})),
			)
		}
	}
}

// Daraja retries delivery on anything but 200, so every readable callback is
// acknowledged.
pub async fn stk_callback(body: Bytes) -> (StatusCode, Json<Value>) {
	match parse_callback(&body) {
		Ok(outcome) => {
			record_outcome(&outcome);
			(StatusCode::OK, Json(json!({"message": "Callback received successfully"})))
		}
		Err(e) => {
			error!("Failed to process callback: {}", e);
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(json!({"error": "Failed to process callback"})),
			)
		}
	}
}

pub async fn health() -> Json<Value> {
	Json(json!({
		"status": "healthy",
		"service": "mpesa-bridge",
		"version": env!("CARGO_PKG_VERSION"),
	}))
}
