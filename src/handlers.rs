//! HTTP route handlers for the hotel site and the preview API.

use crate::auth::clear_session;
use crate::error::{Error, Result};
use crate::models::{FieldRef, FieldType, PatchPayload};
use crate::overlay::{parse_submission, show_editor, EditorSeed, FormValues, SaveState};
use crate::preview::WRONG_PASSWORD_MESSAGE;
use crate::schema;
use crate::site::{self, PageOptions};
use crate::theme::{palette_for_color, Rgba};
use crate::AppState;
use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

const CONTENT_UNAVAILABLE: &str = "Content is temporarily unavailable.";

fn content_error(e: crate::error::RemoteError) -> Response {
    tracing::error!(error = %e, "failed to load page content");
    (StatusCode::BAD_GATEWAY, CONTENT_UNAVAILABLE).into_response()
}

// ============================================================================
// Pages
// ============================================================================

pub async fn home(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    jar: CookieJar,
) -> Response {
    let content = match site::load_content(state.store.as_ref()).await {
        Ok(c) => c,
        Err(e) => return content_error(e),
    };
    let opts = state.page_options(query.as_deref(), &jar);
    Html(site::render_home(&content, &opts).to_html()).into_response()
}

pub async fn room(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    RawQuery(query): RawQuery,
    jar: CookieJar,
) -> Response {
    let opts = state.page_options(query.as_deref(), &jar);
    let settings = match state.store.get_document(site::SETTINGS_ID).await {
        Ok(s) => s.unwrap_or_default(),
        Err(e) => return content_error(e),
    };
    match site::find_room(state.store.as_ref(), &slug).await {
        Ok(Some(room)) => Html(site::render_room(&settings, &room, &opts).to_html()).into_response(),
        Ok(None) => not_found_page(&settings, &opts),
        Err(e) => content_error(e),
    }
}

fn not_found_page(settings: &serde_json::Value, opts: &PageOptions) -> Response {
    (
        StatusCode::NOT_FOUND,
        Html(site::render_not_found(settings, opts).to_html()),
    )
        .into_response()
}

pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "store": state.store.name(),
        "editing": state.editing_enabled(),
    }))
}

// ============================================================================
// Preview Session
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

pub async fn preview_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Response {
    let Some(gate) = state.gate.clone() else {
        return Error::EditingDisabled.into_response();
    };
    let mut session = state.session(jar);
    if gate.check_password(&req.password, &mut session) {
        (session.into_jar(), StatusCode::NO_CONTENT).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, WRONG_PASSWORD_MESSAGE).into_response()
    }
}

pub async fn preview_logout(jar: CookieJar) -> Response {
    (clear_session(jar), Redirect::to("/")).into_response()
}

fn require_session(state: &AppState, jar: &CookieJar) -> Result<()> {
    if !state.editing_enabled() {
        return Err(Error::EditingDisabled);
    }
    if !state.is_authenticated(jar) {
        return Err(Error::Unauthenticated);
    }
    Ok(())
}

// ============================================================================
// Editor & Theme
// ============================================================================

#[derive(Deserialize)]
pub struct EditorQuery {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub bg: String,
}

/// Overlay markup for one field, pre-filled with its current value.
pub async fn preview_editor(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(q): Query<EditorQuery>,
) -> Result<Html<String>> {
    require_session(&state, &jar)?;
    let field = FieldRef::parse(&q.field)?;
    let non_empty = |s: String| Some(s).filter(|s| !s.trim().is_empty());
    let seed = EditorSeed {
        value: q.value,
        url: non_empty(q.url),
        target: q.target.parse().ok(),
        label: non_empty(q.label),
    };
    let palette = palette_for_color(background(&q.bg).unwrap_or(Rgba::WHITE));
    let form = show_editor(&field, q.field_type, &seed);
    tracing::debug!(field = %field, kind = %q.field_type, %palette, "editor requested");
    Ok(Html(form.to_html(palette, &SaveState::Idle)))
}

#[derive(Deserialize)]
pub struct ThemeQuery {
    pub bg: String,
}

#[derive(Serialize)]
pub struct ThemeResponse {
    pub palette: &'static str,
    pub variables: BTreeMap<&'static str, &'static str>,
}

/// A sampled background; transparent counts as the white page behind it.
fn background(raw: &str) -> std::result::Result<Rgba, String> {
    let color: Rgba = raw.parse()?;
    Ok(if color.is_transparent() { Rgba::WHITE } else { color })
}

pub async fn preview_theme(Query(q): Query<ThemeQuery>) -> Response {
    match background(&q.bg) {
        Ok(color) => {
            let id = palette_for_color(color);
            Json(ThemeResponse {
                palette: id.as_str(),
                variables: id.palette().css_variables().into_iter().collect(),
            })
            .into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

// ============================================================================
// Save
// ============================================================================

#[derive(Deserialize)]
pub struct SaveRequest {
    pub field: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub values: FormValues,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub transaction_id: String,
    pub payload: PatchPayload,
}

/// The one write path: validated here, committed with the server's credential.
pub async fn preview_save(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<SaveRequest>,
) -> Result<Json<SaveResponse>> {
    require_session(&state, &jar)?;
    let field = FieldRef::parse(&req.field)?;
    let doc_type = req.doc_type.as_deref();
    // The content model wins over whatever type the page reported.
    let field_type = doc_type
        .and_then(|t| schema::declared_kind(t, &field.field_name()))
        .unwrap_or(req.field_type);
    let payload = parse_submission(field_type, &req.values)?;

    let session = state.session(jar);
    let receipt = state
        .patch
        .save(&session, &field, &payload, field_type, doc_type)
        .await?;
    Ok(Json(SaveResponse {
        transaction_id: receipt.transaction_id,
        payload,
    }))
}
