//! Public page serving.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use pagehost_core::{Error as StoreError, rewrite};

use super::AppState;
use super::error::ServerError;

/// Handle GET /p/{slug}.
///
/// Malformed slugs get the same 404 as unknown ones.
pub(crate) async fn serve_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    let lookup = slug.clone();
    match state.with_store(move |store| store.get(&lookup)).await {
        Ok(site) => Html(rewrite(
            &site.index_content,
            site.slug.as_str(),
            &state.public_prefix,
        ))
        .into_response(),
        Err(ServerError::Store(StoreError::NotFound(_) | StoreError::InvalidInput(_))) => {
            tracing::debug!(slug = %slug, "Page not found");
            (StatusCode::NOT_FOUND, "Page not found").into_response()
        }
        Err(err) => err.into_response(),
    }
}
