#![allow(dead_code)]

use std::{
	collections::HashMap,
	sync::{Arc, Mutex},
	time::Duration,
};

use axum::{
	body::{Body, Bytes},
	extract::{Query, State},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::{get, post},
	Extension, Json, Router,
};
use http_body_util::BodyExt;
use hyper::ext::ReasonPhrase;
use mpesa_bridge::{
	payment_gateway::mpesa_payment_gateway::MpesaPaymentProcessor,
	routes::{app, AppState},
	MpesaConfig,
};
use serde_json::{json, Value};

pub const CONSUMER_KEY: &str = "test-consumer-key";
pub const CONSUMER_SECRET: &str = "test-consumer-secret";
pub const SHORTCODE: &str = "174379";
pub const PASSKEY: &str = "bfb279f9aa9bdbcf158e97dd71a467cd2e0c893059b10f78e6b72ada1ed2c919";
pub const CALLBACK_URL: &str = "https://merchant.example.com/stk-callback";
pub const ACCESS_TOKEN: &str = "fake-access-token";

/// What the fake Daraja answers.
#[derive(Clone)]
pub struct Behaviour {
	pub token_status: StatusCode,
	/// Non-standard reason phrase sent on the token status line.
	pub token_reason: Option<&'static [u8]>,
	pub token_body: Value,
	pub push_status: StatusCode,
	pub push_body: Option<Value>,
}

impl Default for Behaviour {
	fn default() -> Self {
		Behaviour {
			token_status: StatusCode::OK,
			token_reason: None,
			token_body: json!({"access_token": ACCESS_TOKEN, "expires_in": "3599"}),
			push_status: StatusCode::OK,
			push_body: Some(json!({
				"MerchantRequestID": "29115-34620561-1",
				"CheckoutRequestID": "ws_CO_191220191020363925",
				"ResponseCode": "0",
				"ResponseDescription": "Success. Request accepted for processing",
				"CustomerMessage": "Success. Request accepted for processing"
			})),
		}
	}
}

#[derive(Default)]
pub struct Recorded {
	/// Authorization header and query string of each token request.
	pub token_requests: Vec<(Option<String>, HashMap<String, String>)>,
	/// Authorization header and JSON body of each push request.
	pub push_requests: Vec<(Option<String>, Value)>,
}

#[derive(Clone)]
struct FakeState {
	behaviour: Arc<Behaviour>,
	recorded: Arc<Mutex<Recorded>>,
}

pub struct FakeDaraja {
	pub base_url: String,
	recorded: Arc<Mutex<Recorded>>,
}

impl FakeDaraja {
	pub fn token_requests(&self) -> Vec<(Option<String>, HashMap<String, String>)> {
		self.recorded.lock().unwrap().token_requests.clone()
	}

	pub fn push_requests(&self) -> Vec<(Option<String>, Value)> {
		self.recorded.lock().unwrap().push_requests.clone()
	}
}

fn authorization(headers: &HeaderMap) -> Option<String> {
	headers
		.get("authorization")
		.and_then(|v| v.to_str().ok())
		.map(str::to_string)
}

async fn token_handler(
	State(state): State<FakeState>,
	Query(query): Query<HashMap<String, String>>,
	headers: HeaderMap,
) -> Response {
	state
		.recorded
		.lock()
		.unwrap()
		.token_requests
		.push((authorization(&headers), query));

	let status = state.behaviour.token_status;
	let body = Json(state.behaviour.token_body.clone());
	match state.behaviour.token_reason {
		Some(reason) => {
			(status, Extension(ReasonPhrase::from_static(reason)), body).into_response()
		}
		None => (status, body).into_response(),
	}
}

async fn push_handler(State(state): State<FakeState>, headers: HeaderMap, body: Bytes) -> Response {
	let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
	state
		.recorded
		.lock()
		.unwrap()
		.push_requests
		.push((authorization(&headers), parsed));

	match &state.behaviour.push_body {
		Some(body) => (state.behaviour.push_status, Json(body.clone())).into_response(),
		None => (state.behaviour.push_status, "<html>Bad Gateway</html>").into_response(),
	}
}

/// Starts a stand-in for the Daraja API on an ephemeral local port.
pub async fn spawn_fake_daraja(behaviour: Behaviour) -> FakeDaraja {
	let recorded = Arc::new(Mutex::new(Recorded::default()));
	let state = FakeState {
		behaviour: Arc::new(behaviour),
		recorded: recorded.clone(),
	};
	let router = Router::new()
		.route("/oauth/v1/generate", get(token_handler))
		.route("/mpesa/stkpush/v1/processrequest", post(push_handler))
		.with_state(state);

	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, router).await.unwrap();
	});

	FakeDaraja {
		base_url: format!("http://{}", addr),
		recorded,
	}
}

/// A base URL nothing listens on.
pub async fn closed_base_url() -> String {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);
	format!("http://{}", addr)
}

pub fn test_config(base_url: &str) -> MpesaConfig {
	MpesaConfig {
		consumer_key: CONSUMER_KEY.to_string(),
		consumer_secret: CONSUMER_SECRET.to_string(),
		shortcode: SHORTCODE.to_string(),
		passkey: PASSKEY.to_string(),
		callback_url: CALLBACK_URL.to_string(),
		base_url: base_url.to_string(),
		http_timeout: Duration::from_secs(5),
		cache_token: false,
	}
}

pub fn test_app(config: &MpesaConfig) -> Router {
	let processor = MpesaPaymentProcessor::new(config).unwrap();
	app(AppState { processor })
}

pub fn json_request(uri: &str, body: &Value) -> axum::http::Request<Body> {
	axum::http::Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(serde_json::to_vec(body).unwrap()))
		.unwrap()
}

pub async fn body_json(response: axum::http::Response<Body>) -> Value {
	let bytes = response.into_body().collect().await.unwrap().to_bytes();
	serde_json::from_slice(&bytes).unwrap()
}
