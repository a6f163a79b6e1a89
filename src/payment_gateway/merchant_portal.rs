use crate::config::MpesaConfig;

/// The paybill account that receives STK payments.
#[derive(Clone, Debug)]
pub struct Merchant {
	pub pass_key: String,
	pub business_short_code: String,
	pub callback_url: String,
}

impl Merchant {
	pub fn from_config(config: &MpesaConfig) -> Self {
		Merchant {
			pass_key: config.passkey.clone(),
			business_short_code: config.shortcode.clone(),
			callback_url: config.callback_url.clone(),
		}
	}
}
