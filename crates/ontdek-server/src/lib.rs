pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::EditorGate;
use crate::state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let gate = Arc::new(EditorGate::new(
        app_state.editor_token().map(str::to_string),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(routes::health::health))
        // Settings
        .route(
            "/api/settings",
            get(routes::settings::get_settings).put(routes::settings::put_settings),
        )
        // Users
        .route(
            "/api/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route(
            "/api/users/{id}",
            get(routes::users::get_user)
                .patch(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        // Ranked collections
        .route(
            "/api/{collection}",
            get(routes::content::list_entries).post(routes::content::create_entry),
        )
        .route(
            "/api/{collection}/normalize",
            post(routes::content::normalize_collection),
        )
        .route(
            "/api/{collection}/by-slug/{slug}",
            get(routes::content::get_entry_by_slug),
        )
        .route(
            "/api/{collection}/{id}",
            get(routes::content::get_entry)
                .patch(routes::content::update_entry)
                .delete(routes::content::delete_entry),
        )
        .route(
            "/api/{collection}/{id}/restore",
            post(routes::content::restore_entry),
        )
        .layer(middleware::from_fn_with_state(gate, auth::editor_gate))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the API server for the site rooted at `root`.
///
/// `port` overrides `server.port` from `ontdek.yaml`.
pub async fn serve(root: &Path, port: Option<u16>) -> anyhow::Result<()> {
    let app_state = AppState::open(root)?;
    let port = port.unwrap_or(app_state.config.server.port);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener).await
}

/// Start the API server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(app_state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let site = app_state.config.site.name.clone();
    let gated = app_state.editor_token().is_some();
    let app = build_router(app_state);

    tracing::info!(%site, editor_token = gated, "listening on http://localhost:{actual_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("received SIGTERM, shutting down");
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
