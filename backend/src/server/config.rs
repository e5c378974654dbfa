//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::PathBuf;

use backend::domain::token::DEFAULT_TOKEN_TTL_HOURS;
use backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) public_base_url: String,
    pub(crate) uploads_dir: PathBuf,
    pub(crate) cors_allowed_origins: Vec<String>,
    pub(crate) token_ttl_hours: i64,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a configuration from the process environment.
    ///
    /// Variables: `BIND_ADDR`, `PUBLIC_BASE_URL`, `UPLOADS_DIR`,
    /// `CORS_ALLOWED_ORIGINS` (comma-separated), `TOKEN_TTL_HOURS`.
    ///
    /// # Errors
    /// Returns [`std::io::Error`] when a variable is present but malformed.
    pub fn from_env() -> std::io::Result<Self> {
        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|err| std::io::Error::other(format!("invalid BIND_ADDR: {err}")))?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_owned());
        let uploads_dir = std::env::var("UPLOADS_DIR")
            .map_or_else(|_| PathBuf::from("uploads"), PathBuf::from);
        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_else(|_| vec!["http://localhost:3000".to_owned()]);
        let token_ttl_hours = match std::env::var("TOKEN_TTL_HOURS") {
            Ok(raw) => raw
                .parse()
                .map_err(|err| std::io::Error::other(format!("invalid TOKEN_TTL_HOURS: {err}")))?,
            Err(_) => DEFAULT_TOKEN_TTL_HOURS,
        };

        Ok(Self {
            bind_addr,
            public_base_url,
            uploads_dir,
            cors_allowed_origins,
            token_ttl_hours,
            db_pool: None,
        })
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, the server uses the Diesel-backed port implementations;
    /// without one it falls back to the in-memory fixtures (development mode).
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
