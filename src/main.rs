use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use studio_ub::{app, auth::SqliteSessionStore, config::Settings, state::AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studio_ub=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load();

    let store = SqliteSessionStore::open(&settings.database_path, &settings.auth)
        .expect("Failed to initialize session database");

    if let (Some(username), Some(password)) = (
        settings.auth.admin_username.as_deref(),
        settings.auth.admin_password.as_deref(),
    ) {
        if let Err(e) = store.ensure_admin(username, password) {
            tracing::warn!("Failed to create admin account '{}': {}", username, e);
        }
    } else {
        tracing::info!("ADMIN_USERNAME/ADMIN_PASSWORD not set, skipping admin bootstrap");
    }

    let bind_addr = settings.bind_addr();
    let port = settings.server_port;
    let state = AppState::new(Arc::new(store), settings);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

    tracing::info!("Server running on http://localhost:{}", port);

    axum::serve(listener, app::router(state))
        .await
        .expect("Server failed to start");
}
