use std::time::Duration;

use crate::error::MpesaError;

pub const DEFAULT_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
pub const DEFAULT_PORT: u16 = 6000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Daraja credentials and client settings.
#[derive(Debug, Clone)]
pub struct MpesaConfig {
	pub consumer_key: String,
	pub consumer_secret: String,
	pub shortcode: String,
	pub passkey: String,
	pub callback_url: String,
	pub base_url: String,
	pub http_timeout: Duration,
	pub cache_token: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
	pub mpesa: MpesaConfig,
	pub port: u16,
}

impl Config {
	/// Load configuration from the process environment.
	pub fn from_env() -> Result<Self, MpesaError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Load configuration through an arbitrary variable lookup. Empty values
	/// count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, MpesaError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
		let required = |key: &str| {
			get(key).ok_or_else(|| MpesaError::Config(format!("Missing {}", key)))
		};

		let port = match get("PORT") {
			Some(raw) => raw
				.parse::<u16>()
				.map_err(|_| {
					MpesaError::Config(format!("PORT must be a valid u16, got {:?}", raw))
				})?,
			None => DEFAULT_PORT,
		};

		let timeout_secs = match get("MPESA_HTTP_TIMEOUT_SECS") {
			Some(raw) => raw
				.parse::<u64>()
				.map_err(|_| {
					MpesaError::Config(format!(
						"MPESA_HTTP_TIMEOUT_SECS must be a number of seconds, got {:?}",
						raw
					))
				})?,
			None => DEFAULT_HTTP_TIMEOUT_SECS,
		};

		let cache_token = match get("MPESA_CACHE_TOKEN") {
			Some(raw) => raw
				.to_lowercase()
				.parse::<bool>()
				.map_err(|_| {
					MpesaError::Config(format!(
						"MPESA_CACHE_TOKEN must be true or false, got {:?}",
						raw
					))
				})?,
			None => false,
		};

		let base_url = get("MPESA_BASE_URL")
			.unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
			.trim_end_matches('/')
			.to_string();

		Ok(Config {
			mpesa: MpesaConfig {
				consumer_key: required("MPESA_CONSUMER_KEY")?,
				consumer_secret: required("MPESA_CONSUMER_SECRET")?,
				shortcode: required("MPESA_SHORTCODE")?,
				passkey: required("MPESA_PASSKEY")?,
				callback_url: required("MPESA_CALLBACK_URL")?,
				base_url,
				http_timeout: Duration::from_secs(timeout_secs),
				cache_token,
			},
			port,
		})
	}
}
