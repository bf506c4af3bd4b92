use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

use super::{load_settings, open_store};
use crate::GlobalArgs;
use crate::server::{AppState, PasswordAuthenticator, create_router};

/// Start the public and admin HTTP server.
///
/// Configuration is resolved from the config file, `ADMIN_PASSWORD`, and
/// the `--host`/`--port`/`--root` flags, in that order of precedence
/// (flags win). The server refuses to start without an admin password.
pub async fn run(global: &GlobalArgs, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_settings(global)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let password = config.require_password()?.to_string();
    let store = open_store(&config)?;

    println!("🌐 Starting pagehost...");
    println!("   Store: {}", store.root().display());
    println!("   Static files: {}/", config.store.public_prefix);

    let state = AppState {
        store: Arc::new(store),
        auth: Arc::new(PasswordAuthenticator::new(password)),
        public_prefix: config.store.public_prefix.clone(),
        cookie_name: config.admin.cookie_name.clone(),
    };
    let app = create_router(state, config.server.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Ready at: http://{}", addr);
    println!("   Admin: http://{}/admin/login", addr);
    println!("   Press Ctrl+C to stop\n");
    tracing::info!(address = %addr, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

/// Wait for Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
