//! Admin handlers: login, dashboard, upload, edit and delete.
//!
//! Everything except the login routes requires an [`AdminSession`].

use axum::Form;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use pagehost_core::AssetKind;
use serde::Deserialize;

use super::auth::{AdminSession, clear_cookie, session_cookie};
use super::error::ServerError;
use super::templates;
use super::upload::UploadForm;
use super::{AppState, DASHBOARD_PATH, LOGIN_PATH};

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    error: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    password: String,
}

#[derive(Deserialize)]
pub(crate) struct EditForm {
    html_content: String,
}

#[derive(Deserialize)]
pub(crate) struct DeleteAssetForm {
    file_type: String,
    filename: String,
}

/// Handle GET /admin/login.
pub(crate) async fn login_page(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(templates::login_page(query.error.is_some()))
}

/// Handle POST /admin/login.
pub(crate) async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth.login(&form.password) {
        Some(token) => {
            tracing::info!("Admin logged in");
            (
                AppendHeaders([(header::SET_COOKIE, session_cookie(&state.cookie_name, &token))]),
                Redirect::to(DASHBOARD_PATH),
            )
                .into_response()
        }
        None => {
            tracing::warn!("Failed admin login attempt");
            Redirect::to(&format!("{LOGIN_PATH}?error=1")).into_response()
        }
    }
}

/// Handle GET /admin/logout.
pub(crate) async fn logout(State(state): State<AppState>) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, clear_cookie(&state.cookie_name))]),
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

/// Handle GET /admin.
pub(crate) async fn dashboard(
    _session: AdminSession,
    State(state): State<AppState>,
) -> Result<Html<String>, ServerError> {
    let slugs = state.with_store(|store| store.list()).await?;
    Ok(Html(templates::dashboard(&slugs)))
}

/// Handle GET /upload.
pub(crate) async fn upload_form(_session: AdminSession) -> Html<String> {
    Html(templates::upload_form())
}

/// Handle POST /upload.
pub(crate) async fn upload_submit(
    _session: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, ServerError> {
    let form = UploadForm::read(multipart).await?;
    let slug = state
        .with_store(move |store| {
            store.create(
                form.custom_slug.as_deref(),
                form.html_file.as_deref(),
                &form.css_files,
                &form.img_files,
            )
        })
        .await
        .inspect_err(|err| tracing::warn!(error = %err, "Upload rejected"))?;

    tracing::info!(slug = %slug, "Page created");
    Ok(Html(templates::upload_success(&slug)))
}

/// Handle GET /admin/edit/{slug}.
pub(crate) async fn edit_page(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, ServerError> {
    let site = state.with_store(move |store| store.get(&slug)).await?;
    Ok(Html(templates::edit_page(&site)))
}

/// Handle POST /admin/edit/{slug}.
pub(crate) async fn save_edit(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<EditForm>,
) -> Result<Redirect, ServerError> {
    let target = slug.clone();
    state
        .with_store(move |store| store.update_content(&target, form.html_content.as_bytes()))
        .await?;

    tracing::info!(slug = %slug, "Page content updated");
    Ok(Redirect::to(&templates::edit_url(&slug)))
}

/// Handle POST /admin/upload_assets/{slug}.
pub(crate) async fn upload_assets(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<Redirect, ServerError> {
    let form = UploadForm::read(multipart).await?;
    let count = form.css_files.len() + form.img_files.len();
    let target = slug.clone();
    state
        .with_store(move |store| store.add_assets(&target, &form.css_files, &form.img_files))
        .await?;

    tracing::info!(slug = %slug, count, "Assets uploaded");
    Ok(Redirect::to(&templates::edit_url(&slug)))
}

/// Handle POST /admin/delete_asset/{slug}.
pub(crate) async fn delete_asset(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<DeleteAssetForm>,
) -> Result<Redirect, ServerError> {
    let kind: AssetKind = form.file_type.parse()?;
    let target = slug.clone();
    let filename = form.filename.clone();
    state
        .with_store(move |store| store.delete_asset(&target, kind, &filename))
        .await?;

    tracing::info!(slug = %slug, kind = %kind, filename = %form.filename, "Asset deleted");
    Ok(Redirect::to(&templates::edit_url(&slug)))
}

/// Handle POST /admin/delete_page/{slug}.
pub(crate) async fn delete_page(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Redirect, ServerError> {
    let target = slug.clone();
    state.with_store(move |store| store.delete(&target)).await?;

    tracing::info!(slug = %slug, "Page deleted");
    Ok(Redirect::to(DASHBOARD_PATH))
}
