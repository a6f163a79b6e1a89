use std::sync::Arc;

use log::{info, warn};
use reqwest::Client;
use serde_json::Value;

use super::{
	auth::TokenProvider,
	merchant_portal::Merchant,
	stk_push::{PaymentGateway, PushRequestBuilder},
};
use crate::{config::MpesaConfig, error::MpesaError};

/// Body accepted by `POST /initiate`. Nothing is validated; whatever the
/// caller sent goes to Daraja as is.
#[derive(serde::Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
	pub phone_number: Option<Value>,
	pub amount: Option<Value>,
	pub product_name: Option<Value>,
	pub description: Option<Value>,
}

impl PaymentDetails {
	/// Bodies that are not a JSON object are treated as empty.
	pub fn from_body(body: &[u8]) -> Self {
		if body.is_empty() {
			return PaymentDetails::default();
		}
		let value = match serde_json::from_slice::<Value>(body) {
			Ok(value @ Value::Object(_)) => value,
			Ok(other) => {
				warn!("Non-object /initiate body treated as empty: {}", other);
				return PaymentDetails::default();
			}
			Err(e) => {
				warn!("Unreadable /initiate body treated as empty: {}", e);
				return PaymentDetails::default();
			}
		};
		// Every field is an optional raw value, so an object always fits.
		serde_json::from_value(value).unwrap_or_default()
	}
}

/// Token fetch, request build and push, in that order.
#[derive(Clone)]
pub struct MpesaPaymentProcessor {
	tokens: Arc<TokenProvider>,
	builder: Arc<PushRequestBuilder>,
	gateway: Arc<PaymentGateway>,
}

impl MpesaPaymentProcessor {
	pub fn new(config: &MpesaConfig) -> Result<Self, MpesaError> {
		let http = Client::builder()
			.timeout(config.http_timeout)
			.build()
			.map_err(|e| MpesaError::Config(format!("Unable to build HTTP client: {}", e)))?;

		Ok(MpesaPaymentProcessor {
			tokens: Arc::new(TokenProvider::new(http.clone(), config)),
			builder: Arc::new(PushRequestBuilder::new(Merchant::from_config(config))),
			gateway: Arc::new(PaymentGateway::new(http, config)),
		})
	}

	pub async fn handle_payment(&self, details: PaymentDetails) -> Result<Value, MpesaError> {
		let token = self.tokens.fetch_access_token().await?;

		let description = details.description.as_ref().and_then(Value::as_str);
		let request = self
			.builder
			.build(
				details.phone_number.clone(),
				details.amount.clone(),
				details.product_name.clone(),
				description,
			);
		info!("Sending STK push: {}", request.transaction_desc);

		self.gateway.send_push_request(&token, &request).await
	}
}
