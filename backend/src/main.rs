//! Backend entry-point: wires REST endpoints and OpenAPI docs.

mod server;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::ServerConfig;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let mut config = ServerConfig::from_env()?;

    match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            run_pending_migrations(&database_url)
                .await
                .map_err(std::io::Error::other)?;
            let pool = DbPool::new(PoolConfig::new(&database_url))
                .await
                .map_err(std::io::Error::other)?;
            config = config.with_db_pool(pool);
        }
        Err(_) => {
            // The in-memory fixtures back every port in this mode; state is
            // lost on restart, which is fine for local development.
            warn!("DATABASE_URL not set; running with in-memory storage");
        }
    }

    let health_state = web::Data::new(HealthState::new());
    let bind_addr = config.bind_addr();
    let server = server::create_server(health_state, config)?;
    info!(%bind_addr, "listening");
    server.await
}
