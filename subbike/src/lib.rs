//! # subbike: ridership analytics and bike scheduling backend
//!
//! `subbike` serves the JSON API behind a metro and bike-share operations dashboard. It answers
//! passenger flow questions for metro stations (busiest stations, daily totals, weekly and
//! hourly trends), reports shared-bike counts per station along with a simple demand estimate,
//! and stores bike redistribution plans drafted by operators.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum); all persistence is PostgreSQL
//! through SQLx. Requests flow through a CORS layer and a `TraceLayer`, reach a handler in
//! [`api::handlers`], are authorized with the extractors in [`auth::permissions`], and read or
//! write through the repositories in [`db::handlers`].
//!
//! Authentication is stateless: login and registration return a signed JWT (also set as a
//! session cookie) carrying the user's ID, name and role. Registration is gated by a six-digit
//! code emailed through [`lettre`].
//!
//! Ridership data is loaded out of band. The `subbike-import` binary bulk-upserts hourly
//! station flow CSV files into the database; the server only reads it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use subbike::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = subbike::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     subbike::telemetry::init_telemetry(config.enable_otel_export, subbike::telemetry::SERVER_SERVICE_NAME)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
mod email;
pub mod errors;
pub mod import;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(test)]
pub mod test_utils;

use crate::{
    api::models::users::Role,
    auth::password::{self, Argon2Params},
    config::CorsOrigin,
    db::{
        handlers::{Repository, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    openapi::DashboardApiDoc,
};
use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::{delete, get, post, put},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{PlanId, StationId, UserId};

/// Application state shared across all request handlers.
///
/// ```ignore
/// let state = AppState::builder().db(pool).config(config).build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the subbike database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Open a connection pool with the configured limits
pub async fn connect_pool(database: &config::DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let settings = &database.pool;
    let optional = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(optional(settings.idle_timeout_secs))
        .max_lifetime(optional(settings.max_lifetime_secs))
        .connect(&database.url)
        .await
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent. An existing user with `config.admin_username` keeps its ID; when
/// `admin_password` is set it is re-applied and the account is promoted back to
/// `ROLE_ADMIN`. Without a password nothing is created, since every account needs one.
///
/// Returns the admin's ID, or `None` when no admin exists and none could be created.
#[instrument(skip_all, fields(username = %config.admin_username))]
pub async fn create_initial_admin_user(config: &Config, db: &PgPool) -> anyhow::Result<Option<UserId>> {
    let password_hash = match config.admin_password.as_deref() {
        Some(pwd) => Some(password::hash_blocking(pwd.to_string(), Argon2Params::from(&config.auth.password)).await?),
        None => None,
    };

    let mut tx = db.begin().await?;
    let mut users = Users::new(&mut tx);

    let admin_id = match users.get_user_by_username(&config.admin_username).await? {
        Some(existing) => {
            if password_hash.is_some() {
                users
                    .update(
                        existing.id,
                        &UserUpdateDBRequest {
                            password_hash,
                            role: Some(Role::Admin),
                            ..Default::default()
                        },
                    )
                    .await?;
                debug!("re-applied initial admin password");
            }
            Some(existing.id)
        }
        None => match password_hash {
            Some(password_hash) => {
                let created = users
                    .create(&UserCreateDBRequest {
                        username: config.admin_username.clone(),
                        email: config.admin_email.clone(),
                        password_hash,
                        role: Role::Admin,
                    })
                    .await?;
                info!(user_id = created.id, "created initial admin user");
                Some(created.id)
            }
            None => {
                warn!("admin_password is not set, skipping initial admin creation");
                None
            }
        },
    };

    tx.commit().await?;
    Ok(admin_id)
}

async fn setup_database(config: &Config, pool: Option<PgPool>) -> anyhow::Result<PgPool> {
    let pool = match pool {
        Some(pool) => pool,
        None => {
            info!("Connecting to database");
            connect_pool(&config.database).await?
        }
    };

    migrator().run(&pool).await?;

    create_initial_admin_user(config, &pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors_config = &config.auth.security.cors;

    let allow_origin = if cors_config.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        if cors_config.allow_credentials {
            anyhow::bail!("CORS: a wildcard origin cannot be combined with allow_credentials");
        }
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &cors_config.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                // Origins never carry a trailing slash
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(cors_config.allow_credentials);

    if let Some(max_age) = cors_config.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: every `/api/*` route, health check and docs, wrapped in
/// CORS and request tracing.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/auth/send-code", post(api::handlers::auth::send_code))
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/logout", post(api::handlers::auth::logout));

    let user_routes = Router::new()
        // Admin
        .route("/admin/users", get(api::handlers::admin::list_users))
        .route("/admin/users/{id}/role", put(api::handlers::admin::update_user_role))
        .route("/admin/users/{id}", delete(api::handlers::admin::delete_user))
        // Legacy user maintenance
        .route("/users", post(api::handlers::users::create_user))
        .route("/users", put(api::handlers::users::edit_user))
        .route("/users", delete(api::handlers::users::delete_user))
        // Profile
        .route("/user/password", post(api::handlers::profile::change_password))
        .route("/user/email", post(api::handlers::profile::change_email));

    let ridership_routes = Router::new()
        .route("/subway/date", get(api::handlers::subway::top_stations))
        .route("/subway/totals", get(api::handlers::subway::daily_totals))
        .route("/subway/weekly", get(api::handlers::subway::weekly_flow))
        .route("/subway/map", get(api::handlers::subway::station_map))
        .route("/subway/trend", get(api::handlers::subway::hourly_trend))
        .route("/bike/date", get(api::handlers::bike::top_stations))
        .route("/bike/totals", get(api::handlers::bike::station_totals))
        .route("/bike/station", get(api::handlers::bike::station_history))
        .route("/bikeReq/amount", get(api::handlers::bike::requirement))
        .route("/stations/all", get(api::handlers::stations::list_stations));

    let plan_routes = Router::new()
        .route("/scheduling-plans", get(api::handlers::scheduling_plans::list_all_plans))
        .route("/scheduling-plans", post(api::handlers::scheduling_plans::create_plan))
        .route("/scheduling-plans/my-plans", get(api::handlers::scheduling_plans::list_my_plans))
        .route("/scheduling-plans/{id}", get(api::handlers::scheduling_plans::get_plan))
        .route("/scheduling-plans/{id}", put(api::handlers::scheduling_plans::update_plan))
        .route("/scheduling-plans/{id}", delete(api::handlers::scheduling_plans::delete_plan));

    let api_routes = auth_routes
        .merge(user_routes)
        .merge(ridership_routes)
        .merge(plan_routes)
        .route("/openapi.json", get(|| async { Json(DashboardApiDoc::openapi()) }))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .merge(Scalar::with_url("/api/docs", DashboardApiDoc::openapi()))
        .layer(create_cors_layer(&state.config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// A configured server: database ready, admin bootstrapped and router built.
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Connect to the configured database and prepare the application
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], reusing `pool` when given instead of connecting
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting subbike with configuration: {:#?}", config);

        let pool = setup_database(&config, pool).await?;
        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Serve until `shutdown` resolves, then close the pool and flush telemetry
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "subbike listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_config};
    use axum::http::StatusCode;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_initial_admin_user_new_user(pool: PgPool) {
        let mut config = create_test_config();
        config.admin_username = "bootstrap".to_string();
        config.admin_email = "bootstrap@example.com".to_string();

        let user_id = create_initial_admin_user(&config, &pool)
            .await
            .expect("Should create admin user successfully")
            .expect("Admin should exist");

        let mut conn = pool.acquire().await.unwrap();
        let created = Users::new(&mut conn)
            .get_user_by_username("bootstrap")
            .await
            .unwrap()
            .expect("User should exist");

        assert_eq!(created.id, user_id);
        assert_eq!(created.email, "bootstrap@example.com");
        assert_eq!(created.role, Role::Admin);
        assert!(password::verify_string("admin-password", &created.password_hash).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_initial_admin_user_is_idempotent(pool: PgPool) {
        let mut config = create_test_config();
        let first = create_initial_admin_user(&config, &pool).await.unwrap();

        config.admin_password = Some("rotated-password".to_string());
        let second = create_initial_admin_user(&config, &pool).await.unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let admin = Users::new(&mut conn)
            .get_user_by_username(&config.admin_username)
            .await
            .unwrap()
            .unwrap();
        assert!(password::verify_string("rotated-password", &admin.password_hash).unwrap());

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&pool).await.unwrap();
        assert_eq!(count, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_no_admin_without_password(pool: PgPool) {
        let mut config = create_test_config();
        config.admin_password = None;

        let admin = create_initial_admin_user(&config, &pool).await.unwrap();
        assert!(admin.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_application_integration(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");

        let response = server.get("/api/openapi.json").await;
        response.assert_status_ok();
        assert!(response.text().contains("\"openapi\""));

        // Authenticated routes reject anonymous callers
        let response = server.get("/api/admin/users").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admin_can_log_in_after_bootstrap(pool: PgPool) {
        let server = create_test_app(pool).await;

        let response = server
            .post("/api/auth/login")
            .json(&serde_json::json!({"username": "admin", "password": "admin-password"}))
            .await;
        response.assert_status_ok();
    }

    #[test]
    fn test_cors_layer_rejects_wildcard_with_credentials() {
        let mut config = create_test_config();
        assert!(create_cors_layer(&config).is_ok());

        config.auth.security.cors.allow_credentials = true;
        assert!(create_cors_layer(&config).is_err());

        config.auth.security.cors.allowed_origins = vec![CorsOrigin::Url("http://localhost:5173/".parse().unwrap())];
        assert!(create_cors_layer(&config).is_ok());
    }
}
