//! HTTP surface: router wiring, middleware stack, and server bootstrap.

use anyhow::{Context, Result, anyhow};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use sqlx::{Executor, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use url::Url;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers::{auth, content, dashboard, health, users};

pub(crate) mod handlers;
mod openapi;

pub use openapi::openapi;

const SCHEMA: &str = include_str!("../../db/schema.sql");

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, auth_state: Arc<auth::state::AuthState>) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    // Idempotent schema bootstrap; every statement is CREATE IF NOT EXISTS.
    pool.execute(SCHEMA)
        .await
        .context("Failed to apply database schema")?;

    let frontend_origin = frontend_origin(auth_state.config().frontend_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(AllowOrigin::exact(frontend_origin))
        .allow_credentials(true);

    let app = Router::new()
        .route("/api/profile", get(content::public::profile))
        .route("/api/projects", get(content::public::projects))
        .route("/api/projects/:id", get(content::public::project))
        .route("/api/skills", get(content::public::skills))
        .route("/api/contact", get(content::public::contact))
        .route("/api/site-settings", get(content::public::site_settings))
        .route("/api/admin/auth/login", post(auth::login::login))
        .route("/api/admin/auth/logout", post(auth::login::logout))
        .route("/api/admin/auth/me", get(auth::me::me))
        .route(
            "/api/admin/profile",
            get(content::admin::get_profile).put(content::admin::put_profile),
        )
        .route(
            "/api/admin/skills",
            get(content::admin::get_skills).put(content::admin::put_skills),
        )
        .route(
            "/api/admin/contact",
            get(content::admin::get_contact).put(content::admin::put_contact),
        )
        .route(
            "/api/admin/site-settings",
            get(content::admin::get_site_settings).put(content::admin::put_site_settings),
        )
        .route(
            "/api/admin/projects",
            get(content::admin::list_all_projects).post(content::admin::create_project),
        )
        .route(
            "/api/admin/projects/:id",
            get(content::admin::get_project)
                .put(content::admin::put_project)
                .delete(content::admin::delete_project_handler),
        )
        .route(
            "/api/admin/projects/:id/publish",
            post(content::admin::publish_project),
        )
        .route("/api/admin/dashboard/stats", get(dashboard::stats))
        .route(
            "/api/admin/users",
            get(users::list).post(users::create),
        )
        .route(
            "/api/admin/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route(
            "/api/admin/users/:id/reset-password",
            post(users::reset_password),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state.clone()))
                .layer(Extension(pool.clone())),
        )
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi()))
        .route("/health", get(health::health))
        .layer(Extension(pool));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn frontend_origin(frontend_url: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(frontend_url)
        .with_context(|| format!("Invalid frontend URL: {frontend_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Frontend URL must include a valid host: {frontend_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build frontend origin header")
}
