use chrono::{Local, NaiveDateTime};
use log::warn;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::{auth::AccessToken, merchant_portal::Merchant};
use crate::{config::MpesaConfig, encryption_engine::stk_password, error::MpesaError};

pub const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";
pub const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

/// Body of a Daraja STK push. Caller supplied fields are passed through as
/// received; fields the caller left out are not serialized at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PushRequest {
	pub business_short_code: String,
	pub password: String,
	pub timestamp: String,
	pub transaction_type: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub amount: Option<Value>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub party_a: Option<Value>,
	pub party_b: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone_number: Option<Value>,
	#[serde(rename = "CallBackURL")]
	pub call_back_url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub account_reference: Option<Value>,
	pub transaction_desc: String,
}

pub fn format_timestamp(now: NaiveDateTime) -> String {
	now.format("%Y%m%d%H%M%S").to_string()
}

// Renders a pass-through value the way it reads inside a sentence.
fn display_value(value: Option<&Value>) -> String {
	match value {
		None | Some(Value::Null) => String::new(),
		Some(Value::String(s)) => s.clone(),
		Some(other) => other.to_string(),
	}
}

pub fn default_description(amount: Option<&Value>, account_reference: Option<&Value>) -> String {
	format!(
		"Payment of KES {} for {}",
		display_value(amount),
		display_value(account_reference)
	)
}

pub struct PushRequestBuilder {
	merchant: Merchant,
}

impl PushRequestBuilder {
	pub fn new(merchant: Merchant) -> Self {
		PushRequestBuilder { merchant }
	}

	pub fn build(
		&self,
		phone_number: Option<Value>,
		amount: Option<Value>,
		account_reference: Option<Value>,
		description: Option<&str>,
	) -> PushRequest {
		self.build_at(
			Local::now().naive_local(),
			phone_number,
			amount,
			account_reference,
			description,
		)
	}

	pub fn build_at(
		&self,
		now: NaiveDateTime,
		phone_number: Option<Value>,
		amount: Option<Value>,
		account_reference: Option<Value>,
		description: Option<&str>,
	) -> PushRequest {
		let shortcode = &self.merchant.business_short_code;
		let timestamp = format_timestamp(now);
		let password = stk_password(shortcode, &self.merchant.pass_key, &timestamp);

		let transaction_desc = match description {
			Some(desc) if !desc.is_empty() => desc.to_string(),
			_ => default_description(amount.as_ref(), account_reference.as_ref()),
		};

		PushRequest {
			business_short_code: shortcode.clone(),
			password,
			timestamp,
			transaction_type: TRANSACTION_TYPE.to_string(),
			amount,
			party_a: phone_number.clone(),
			party_b: shortcode.clone(),
			phone_number,
			call_back_url: self.merchant.callback_url.clone(),
			account_reference,
			transaction_desc,
		}
	}
}

/// Posts STK push requests and hands back whatever JSON the provider answered
/// with. Daraja reports rejection inside the payload, so the HTTP status is
/// only logged.
pub struct PaymentGateway {
	http: Client,
	url: String,
}

impl PaymentGateway {
	pub fn new(http: Client, config: &MpesaConfig) -> Self {
		PaymentGateway {
			http,
			url: format!("{}{}", config.base_url, STK_PUSH_PATH),
		}
	}

	pub async fn send_push_request(
		&self,
		access_token: &AccessToken,
		request: &PushRequest,
	) -> Result<Value, MpesaError> {
		let response = self
			.http
			.post(&self.url)
			.bearer_auth(&access_token.token)
			.json(request)
			.send()
			.await
			.map_err(MpesaError::GatewaySend)?;

		let status = response.status();
		let body = response.json::<Value>().await.map_err(MpesaError::GatewaySend)?;
		if !status.is_success() {
			warn!("STK push answered with HTTP {}: {}", status, body);
		}
		Ok(body)
	}
}
