/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use homecare_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = homecare_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{Config, ProvisioningConfig},
    middleware::security::SecurityHeadersLayer,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use homecare_shared::{
    auth::session::{BearerSessionResolver, SessionResolver},
    tenancy::{
        Bootstrapper, CaregiverStore, PersonalAgencyPolicy, PgStore, ProvisioningMode,
        ProvisioningPolicy, SharedAgencyPolicy, TenancyStore, TenantResolver,
    },
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Request to identity resolution
    pub sessions: Arc<dyn SessionResolver>,

    /// Agencies, users and memberships
    pub tenancy: Arc<dyn TenancyStore>,

    /// Caregiver roster
    pub caregivers: Arc<dyn CaregiverStore>,

    /// Placement of newly bootstrapped identities
    pub provisioning: Arc<dyn ProvisioningPolicy>,
}

impl AppState {
    /// Creates application state backed by PostgreSQL
    pub fn new(db: PgPool, config: Config) -> Self {
        let mut sessions = BearerSessionResolver::new(config.session.secret.clone());
        if let Some(issuer) = &config.session.issuer {
            sessions = sessions.with_issuer(issuer.clone());
        }

        let store = Arc::new(PgStore::new(db.clone()));
        let provisioning = provisioning_policy(&config.provisioning);

        Self::with_components(
            db,
            config,
            Arc::new(sessions),
            store.clone(),
            store,
            provisioning,
        )
    }

    /// Creates application state from explicit components
    pub fn with_components(
        db: PgPool,
        config: Config,
        sessions: Arc<dyn SessionResolver>,
        tenancy: Arc<dyn TenancyStore>,
        caregivers: Arc<dyn CaregiverStore>,
        provisioning: Arc<dyn ProvisioningPolicy>,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            sessions,
            tenancy,
            caregivers,
            provisioning,
        }
    }

    /// Resolver for tenant-scoped routes
    pub fn tenant_resolver(&self) -> TenantResolver {
        TenantResolver::new(self.sessions.clone(), self.tenancy.clone())
    }

    /// Bootstrapper for first-login provisioning
    pub fn bootstrapper(&self) -> Bootstrapper {
        Bootstrapper::new(
            self.sessions.clone(),
            self.tenancy.clone(),
            self.provisioning.clone(),
        )
    }
}

/// Builds the configured provisioning policy
pub fn provisioning_policy(config: &ProvisioningConfig) -> Arc<dyn ProvisioningPolicy> {
    match config.mode {
        ProvisioningMode::Shared => {
            Arc::new(SharedAgencyPolicy::new(config.default_agency_name.clone()))
        }
        ProvisioningMode::Personal => Arc::new(PersonalAgencyPolicy),
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check (public)
/// └── /api/
///     ├── GET  /me/init         # Bootstrap the caller (session required)
///     ├── GET  /caregivers      # List the caller's roster (tenant-scoped)
///     └── POST /caregivers      # Add a caregiver (tenant-scoped)
/// ```
///
/// Authentication happens inside the handlers, since each route maps a
/// missing session to its own error envelope.
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let api_routes = Router::new()
        .route("/me/init", get(routes::me::init))
        .route(
            "/caregivers",
            get(routes::caregivers::list_caregivers).post(routes::caregivers::create_caregiver),
        );

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}
