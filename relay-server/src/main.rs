//! VerusID Login Relay Server
//!
//! Issues single-use login challenges as signed login-consent requests,
//! verifies wallet responses against chain-resolved identities, and reports
//! verified logins to the platform session layer exactly once per challenge.

mod config;
mod routes;
mod services;
mod store;

use actix_web::{middleware, web, App, HttpServer};
use relay_common::{RelayError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use verusid_login::IdentityClient;

use config::Config;
use services::issuer::ChallengeIssuer;
use services::reporter::OutcomeReporter;
use services::verifier::ResponseVerifier;
use store::{ChallengeStore, MemoryChallengeStore};

/// Per-call timeout for chain API lookups
const ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay between platform callback retry attempts
const REPORT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChallengeStore>,
    pub issuer: ChallengeIssuer,
    pub verifier: ResponseVerifier,
    pub started_at: Instant,
}

impl AppState {
    pub fn build(config: &Config) -> Result<Self> {
        let store: Arc<dyn ChallengeStore> = Arc::new(MemoryChallengeStore::new());

        let issuer = ChallengeIssuer::new(config, store.clone())?;
        let identity = IdentityClient::new(config.chain_api_url.clone(), ADAPTER_TIMEOUT)
            .map_err(|e| RelayError::ConfigError(e.to_string()))?;
        let reporter = OutcomeReporter::new(
            &config.platform_internal_url,
            store.clone(),
            REPORT_RETRY_DELAY,
        )?;
        let verifier = ResponseVerifier::new(identity, store.clone(), reporter);

        Ok(Self {
            store,
            issuer,
            verifier,
            started_at: Instant::now(),
        })
    }
}

/// Periodic garbage collection of expired challenges. Lazy expiry at read
/// time is the correctness guarantee; this only reclaims memory.
fn spawn_sweeper(store: Arc<dyn ChallengeStore>, ttl_secs: i64, grace_secs: i64) {
    let interval = Duration::from_secs(ttl_secs.max(1) as u64);
    let grace = chrono::Duration::seconds(grace_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.sweep(grace).await;
            if removed > 0 {
                debug!(removed, "swept expired challenges");
            }
        }
    });
}

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting VerusID login relay...");

    let config = Config::from_env()?;
    let state = AppState::build(&config)?;
    spawn_sweeper(
        state.store.clone(),
        config.challenge_ttl_secs,
        config.sweep_grace_secs,
    );

    let bind_addr = format!("0.0.0.0:{}", config.port);
    info!(signing_id = %config.signing_id, chain = %config.chain_id, "listening on {bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .service(routes::login::login)
            .service(routes::callback::verusid_login)
            .service(routes::status::status)
            .service(routes::health::health_check)
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    Ok(())
}
