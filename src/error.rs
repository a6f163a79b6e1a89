use thiserror::Error;

#[derive(Error, Debug)]
pub enum MpesaError {
	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Failed to fetch token: {status} {reason}")]
	TokenFetch { status: u16, reason: String },

	#[error("Token request failed: {0}")]
	TokenTransport(#[source] reqwest::Error),

	#[error("Malformed token response: {0}")]
	TokenParse(String),

	#[error("STK push request failed: {0}")]
	GatewaySend(#[source] reqwest::Error),

	#[error("Malformed callback body: {0}")]
	CallbackParse(String),
}

impl MpesaError {
	/// True for failures raised while obtaining an access token.
	pub fn is_auth_error(&self) -> bool {
		matches!(
			self,
			MpesaError::TokenFetch { .. }
				| MpesaError::TokenTransport(_)
				| MpesaError::TokenParse(_)
		)
	}
}
