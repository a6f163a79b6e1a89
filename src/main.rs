use std::net::SocketAddr;

use anyhow::Context;
use log::info;
use mpesa_bridge::{
	payment_gateway::mpesa_payment_gateway::MpesaPaymentProcessor,
	routes::{app, AppState},
	Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	dotenvy::dotenv().ok();
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = Config::from_env().context("Unable to load configuration")?;
	let processor = MpesaPaymentProcessor::new(&config.mpesa)?;

	let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
	let listener = tokio::net::TcpListener::bind(addr)
		.await
		.with_context(|| format!("Unable to bind {}", addr))?;
	info!("M-Pesa bridge listening on {} (provider {})", addr, config.mpesa.base_url);

	axum::serve(listener, app(AppState { processor }))
		.await
		.context("Server failed")?;
	Ok(())
}
