//! HTTP server: public page serving and the admin interface.
//!
//! ```text
//! /                    → redirect to /admin/login
//! /p/{slug}            → stored index.html with asset URLs rewritten
//! {public_prefix}/...  → raw files from the store root (ServeDir)
//! /admin, /upload ...  → password-gated admin pages
//! ```

mod admin;
pub mod auth;
mod error;
mod public;
mod templates;
mod upload;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue};
use axum::response::Redirect;
use axum::routing::{get, post};
use pagehost_core::SiteStore;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub use auth::{Authenticator, PasswordAuthenticator};
use error::ServerError;

pub(crate) const LOGIN_PATH: &str = "/admin/login";
pub(crate) const DASHBOARD_PATH: &str = "/admin";

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SiteStore>,
    pub auth: Arc<dyn Authenticator>,
    /// URL prefix the store root is served under, without trailing slash
    pub public_prefix: String,
    pub cookie_name: String,
}

impl AppState {
    /// Run a store operation on the blocking pool.
    pub async fn with_store<T, F>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&SiteStore) -> pagehost_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        Ok(tokio::task::spawn_blocking(move || f(&store)).await??)
    }
}

/// Build the application router.
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    let admin_routes = Router::new()
        .route(LOGIN_PATH, get(admin::login_page).post(admin::login_submit))
        .route("/admin/logout", get(admin::logout))
        .route(DASHBOARD_PATH, get(admin::dashboard))
        .route("/upload", get(admin::upload_form).post(admin::upload_submit))
        .route(
            "/admin/edit/{slug}",
            get(admin::edit_page).post(admin::save_edit),
        )
        .route("/admin/upload_assets/{slug}", post(admin::upload_assets))
        .route("/admin/delete_asset/{slug}", post(admin::delete_asset))
        .route("/admin/delete_page/{slug}", post(admin::delete_page))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ));

    let public_prefix = state.public_prefix.clone();
    let static_files = ServeDir::new(state.store.root());

    Router::new()
        .route("/", get(|| async { Redirect::to(LOGIN_PATH) }))
        .route("/p/{slug}", get(public::serve_page))
        .merge(admin_routes)
        .nest_service(&public_prefix, static_files)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                )),
        )
        .with_state(state)
}
