use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::error::MpesaError;

/// The `Body.stkCallback` object. Fields are read without type checks so an
/// oddly typed id or description never stops the acknowledgement.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StkCallback {
	#[serde(rename = "MerchantRequestID")]
	pub merchant_request_id: Option<Value>,
	#[serde(rename = "CheckoutRequestID")]
	pub checkout_request_id: Option<Value>,
	pub result_code: Option<Value>,
	pub result_desc: Option<Value>,
	pub callback_metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
	pub merchant_request_id: Option<Value>,
	pub checkout_request_id: Option<Value>,
	pub amount: Option<Value>,
	pub receipt_number: Option<Value>,
	pub phone_number: Option<Value>,
	pub transaction_date: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
	Succeeded(PaymentConfirmation),
	Failed {
		checkout_request_id: Option<Value>,
		result_code: Option<Value>,
		result_desc: Option<Value>,
	},
	/// The body carried no `Body.stkCallback` object.
	Ignored,
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

// First item named `name`. A null entry met before the match is malformed;
// entries without a string `Name` are skipped.
fn find_item(items: &[Value], name: &str) -> Result<Option<Value>, MpesaError> {
	for item in items {
		if item.is_null() {
			return Err(MpesaError::CallbackParse(
				"null entry in CallbackMetadata.Item".to_string(),
			));
		}
		if item.get("Name").and_then(Value::as_str) == Some(name) {
			return Ok(item.get("Value").filter(|v| !v.is_null()).cloned());
		}
	}
	Ok(None)
}

impl StkCallback {
	fn metadata_items(&self) -> Result<&[Value], MpesaError> {
		let items = self
			.callback_metadata
			.as_ref()
			.and_then(|meta| meta.get("Item"))
			.filter(|items| is_truthy(items));

		match items {
			None => Ok(&[][..]),
			Some(Value::Array(items)) => Ok(items.as_slice()),
			Some(other) => Err(MpesaError::CallbackParse(format!(
				"CallbackMetadata.Item is not a list: {}",
				other
			))),
		}
	}

	pub fn into_outcome(self) -> Result<CallbackOutcome, MpesaError> {
		let succeeded = self.result_code.as_ref().and_then(Value::as_f64) == Some(0.0);
		if !succeeded {
			return Ok(CallbackOutcome::Failed {
				checkout_request_id: self.checkout_request_id,
				result_code: self.result_code,
				result_desc: self.result_desc,
			});
		}

		let items = self.metadata_items()?;
		let amount = find_item(items, "Amount")?;
		let receipt_number = find_item(items, "MpesaReceiptNumber")?;
		let phone_number = find_item(items, "PhoneNumber")?;
		let transaction_date = find_item(items, "TransactionDate")?;
		Ok(CallbackOutcome::Succeeded(PaymentConfirmation {
			merchant_request_id: self.merchant_request_id,
			checkout_request_id: self.checkout_request_id,
			amount,
			receipt_number,
			phone_number,
			transaction_date,
		}))
	}
}

pub fn parse_callback(body: &[u8]) -> Result<CallbackOutcome, MpesaError> {
	let payload: Value =
		serde_json::from_slice(body).map_err(|e| MpesaError::CallbackParse(e.to_string()))?;

	let Some(raw) = payload.get("Body").and_then(|b| b.get("stkCallback")) else {
		return Ok(CallbackOutcome::Ignored);
	};
	if !raw.is_object() {
		return Ok(CallbackOutcome::Ignored);
	}

	let callback =
		StkCallback::deserialize(raw).map_err(|e| MpesaError::CallbackParse(e.to_string()))?;
	callback.into_outcome()
}

// Persisting confirmed payments would hook in here.
pub fn record_outcome(outcome: &CallbackOutcome) {
	match outcome {
		CallbackOutcome::Succeeded(payment) => info!(
			"STK payment confirmed: checkout={} receipt={} amount={} phone={}",
			show(&payment.checkout_request_id),
			show(&payment.receipt_number),
			show(&payment.amount),
			show(&payment.phone_number)
		),
		CallbackOutcome::Failed {
			checkout_request_id,
			result_code,
			result_desc,
		} => warn!(
			"STK payment failed: checkout={} code={} desc={}",
			show(checkout_request_id),
			show(result_code),
			show(result_desc)
		),
		CallbackOutcome::Ignored => warn!("Callback without Body.stkCallback ignored"),
	}
}

fn show(value: &Option<Value>) -> String {
	match value {
		Some(Value::String(s)) => s.clone(),
		Some(v) => v.to_string(),
		None => "-".to_string(),
	}
}
