use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{rejection::FormRejection, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use shared::{
    domain::Theme,
    error::{ApiError, ErrorCode},
    protocol::{
        StoredPreferences, ThemeForm, ThemeResponse, PREFS_COOKIE, SESSION_COOKIE,
        THEME_ENDPOINT_PATH,
    },
};
use storage::{set_cookie_header, system_clock, CookieJar, KeyValueStore};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

const ANONYMOUS_SESSION: &str = "anonymous";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let state = AppState::new(&settings);
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "preference server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(THEME_ENDPOINT_PATH, get(current_theme).post(save_theme))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

fn request_cookies(headers: &HeaderMap) -> CookieJar {
    let raw = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ");
    CookieJar::from_header(&raw, system_clock())
}

fn session_of(cookies: &CookieJar) -> String {
    cookies
        .get(SESSION_COOKIE)
        .filter(|session| !session.trim().is_empty())
        .unwrap_or_else(|| ANONYMOUS_SESSION.to_string())
}

async fn current_theme(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<ThemeResponse> {
    let session = session_of(&request_cookies(&headers));
    let theme = state.themes.get(&session).await;
    Json(ThemeResponse { theme })
}

async fn save_theme(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    form: Result<Form<ThemeForm>, FormRejection>,
) -> Result<Response, (StatusCode, Json<ApiError>)> {
    let Form(form) = form.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, rejection.body_text())),
        )
    })?;
    let theme = form.theme.parse::<Theme>().map_err(|err| {
        warn!(raw = %form.theme, "rejected theme submission");
        (StatusCode::BAD_REQUEST, Json(ApiError::from(err)))
    })?;

    let cookies = request_cookies(&headers);
    let session = session_of(&cookies);
    state.themes.set(&session, theme).await;

    let mut prefs = cookies
        .get(PREFS_COOKIE)
        .map(|raw| StoredPreferences::decode(&raw))
        .unwrap_or_default();
    prefs.set_theme(theme);
    let cookie = set_cookie_header(PREFS_COOKIE, &prefs.encode(), state.prefs_ttl);

    let location = HeaderValue::from_str(&state.redirect_target).map_err(|err| internal(&err))?;
    let cookie = HeaderValue::from_str(&cookie).map_err(|err| internal(&err))?;
    debug!(%session, %theme, "theme persisted");

    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location), (header::SET_COOKIE, cookie)],
    )
        .into_response())
}

fn internal(err: &dyn std::fmt::Display) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(ErrorCode::Internal, err.to_string())),
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
