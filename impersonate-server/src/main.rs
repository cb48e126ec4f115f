use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use impersonate_core::{Markov, MarkovConfig, MemoryStorage};
use log::info;

mod config;
mod handlers;
mod session;

use config::ServerConfig;
use handlers::AppState;

/// Main entry point for the server.
///
/// Restores the snapshot from the data folder when present, then trains every
/// `<subject>.dat` corpus whose subject has no model yet under the identity
/// `<subject>`. Every identity holding a model is registered so it can be
/// impersonated by name. The snapshot is written again on shutdown.
///
/// # Notes
/// - Settings come from `IMPERSONATE_*` environment variables
/// - Log verbosity follows `RUST_LOG`
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();

	let markov_config = MarkovConfig::from_env()?;
	let config = ServerConfig::from_env()?;
	info!("Starting in {} mode with {markov_config:?}", config.mode.as_str());

	let backend = Arc::new(MemoryStorage::load_or_default(config.snapshot_path())?);
	let markov = Markov::new(markov_config, backend)?;
	let bind = config.bind.clone();
	let state = web::Data::new(AppState::new(markov, config));

	let trained = state.seed_subjects().await?;
	let known = state.restore_users().await?;
	info!("{known} identities known, {trained} subjects trained from corpora");
	if trained > 0 {
		state.save()?;
	}

	let app_state = state.clone();
	info!("Listening on {bind}");
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(app_state.clone())
			.configure(handlers::configure)
	})
		.bind(bind)?
		.run()
		.await?;

	// Keep what was learned from chat messages
	state.save()?;
	Ok(())
}
