use std::{
	fmt,
	time::{Duration, Instant},
};

use hyper::ext::ReasonPhrase;
use log::{debug, error};
use reqwest::{header::AUTHORIZATION, Client};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{config::MpesaConfig, encryption_engine::basic_credentials, error::MpesaError};

pub const TOKEN_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";

// Cached tokens are dropped this long before the provider says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone, PartialEq)]
pub struct AccessToken {
	pub token: String,
	pub expires_in: Option<Duration>,
}

impl fmt::Debug for AccessToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AccessToken")
			.field("token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.finish()
	}
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: Option<Value>,
	expires_in: Option<Value>,
}

impl TokenResponse {
	fn into_access_token(self) -> Result<AccessToken, MpesaError> {
		let token = match self.access_token {
			Some(Value::String(token)) if !token.is_empty() => token,
			Some(other) if !other.is_null() => {
				return Err(MpesaError::TokenParse(format!(
					"access_token is not a string: {}",
					other
				)));
			}
			_ => {
				return Err(MpesaError::TokenParse(
					"access_token missing from token response".to_string(),
				));
			}
		};
		// Daraja reports the lifetime as a string ("3599").
		let expires_in = match self.expires_in {
			Some(Value::String(secs)) => secs.trim().parse::<u64>().ok(),
			Some(Value::Number(secs)) => secs.as_u64(),
			_ => None,
		}
		.map(Duration::from_secs);

		Ok(AccessToken { token, expires_in })
	}
}

// hyper only records the phrase when it differs from the canonical one.
fn reason_phrase(response: &reqwest::Response) -> String {
	match response.extensions().get::<ReasonPhrase>() {
		Some(phrase) => String::from_utf8_lossy(phrase.as_bytes()).into_owned(),
		None => response.status().canonical_reason().unwrap_or("Unknown").to_string(),
	}
}

struct CachedToken {
	token: AccessToken,
	valid_until: Instant,
}

/// Exchanges the consumer key and secret for a bearer token.
pub struct TokenProvider {
	http: Client,
	url: String,
	basic_auth: String,
	cache: Option<Mutex<Option<CachedToken>>>,
}

impl TokenProvider {
	pub fn new(http: Client, config: &MpesaConfig) -> Self {
		TokenProvider {
			http,
			url: format!("{}{}", config.base_url, TOKEN_PATH),
			basic_auth: basic_credentials(&config.consumer_key, &config.consumer_secret),
			cache: config.cache_token.then(|| Mutex::new(None)),
		}
	}

	/// Returns a bearer token. Without the cache every call hits the OAuth
	/// endpoint once. With it, callers queue on the lock so a refresh is only
	/// ever performed by one of them.
	pub async fn fetch_access_token(&self) -> Result<AccessToken, MpesaError> {
		let Some(cache) = &self.cache else {
			return self.request_token().await;
		};

		let mut slot = cache.lock().await;
		if let Some(cached) = slot.as_ref() {
			if Instant::now() < cached.valid_until {
				debug!("Reusing cached access token");
				return Ok(cached.token.clone());
			}
		}

		let token = self.request_token().await?;
		*slot = token
			.expires_in
			.and_then(|ttl| ttl.checked_sub(EXPIRY_MARGIN))
			.filter(|ttl| !ttl.is_zero())
			.map(|ttl| CachedToken {
				token: token.clone(),
				valid_until: Instant::now() + ttl,
			});
		Ok(token)
	}

	async fn request_token(&self) -> Result<AccessToken, MpesaError> {
		let response = self
			.http
			.get(&self.url)
			.header(AUTHORIZATION, format!("Basic {}", self.basic_auth))
			.send()
			.await
			.map_err(|e| {
				error!("Error getting access token: {}", e);
				MpesaError::TokenTransport(e)
			})?;

		let status = response.status();
		if !status.is_success() {
			let err = MpesaError::TokenFetch {
				status: status.as_u16(),
				reason: reason_phrase(&response),
			};
			error!("Error getting access token: {}", err);
			return Err(err);
		}

		let body = response.text().await.map_err(MpesaError::TokenTransport)?;
		let parsed: TokenResponse =
			serde_json::from_str(&body).map_err(|e| MpesaError::TokenParse(e.to_string()))?;
		parsed.into_access_token()
	}
}
