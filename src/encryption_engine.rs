use base64::{
	alphabet,
	engine::{self, general_purpose},
	Engine,
};

/// Daraja expects RFC 4648 base64 with padding for both the Basic auth
/// header and the STK password.
pub const DARAJA_ENGINE: engine::GeneralPurpose =
	engine::GeneralPurpose::new(&alphabet::STANDARD, general_purpose::PAD);

pub fn basic_credentials(consumer_key: &str, consumer_secret: &str) -> String {
	DARAJA_ENGINE.encode(format!("{}:{}", consumer_key, consumer_secret))
}

pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
	DARAJA_ENGINE.encode(format!("{}{}{}", shortcode, passkey, timestamp))
}
