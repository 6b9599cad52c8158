//! HTTP preview server.
//!
//! Serves the rendered navigation page and exposes the persisted switch and
//! hotbutton state so a browser front-end (or curl) can inspect and change
//! it.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /nav` - The rendered page
//! - `GET /api/menus` - Menu keys, labels and catalog issues
//! - `GET /api/menus/{key}` - Rendered HTML of one menu
//! - `GET /api/toggles` - All switches
//! - `PUT /api/toggles/{key}` - Flip a switch
//! - `GET /api/hotbuttons/{key}` - Saved hotbutton config
//! - `PUT /api/hotbuttons/{key}` - Save a hotbutton config
//! - `DELETE /api/hotbuttons/{key}` - Reset a hotbutton

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::constants::APP_NAME;
use crate::hotbutton::{load_config, HotbuttonConfig};
use crate::menu;
use crate::settings::{ToggleChange, ToggleEntry};
use crate::shell::NavShell;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the web API.
#[derive(Clone)]
pub struct AppState {
    shell: Arc<Mutex<NavShell>>,
}

impl AppState {
    /// Builds the shell from the configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::from_shell(NavShell::from_config(config)?))
    }

    /// Wraps an already mounted shell.
    #[must_use]
    pub fn from_shell(shell: NavShell) -> Self {
        Self {
            shell: Arc::new(Mutex::new(shell)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, NavShell> {
        self.shell.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Current health status (e.g., "healthy").
    pub status: String,
    /// Application version.
    pub version: String,
}

/// One menu of the catalog.
#[derive(Debug, Serialize)]
pub struct MenuSummary {
    /// Menu key.
    pub key: String,
    /// Trigger label.
    pub label: String,
    /// Top-level entries, separators included.
    pub items: usize,
    /// Whether the trigger is currently shown.
    pub enabled: bool,
}

/// Menu list response.
#[derive(Debug, Serialize)]
pub struct MenuListResponse {
    /// Menus in bar order.
    pub menus: Vec<MenuSummary>,
    /// Catalog validation findings.
    pub issues: Vec<String>,
}

/// Rendered menu response.
#[derive(Debug, Serialize)]
pub struct MenuHtmlResponse {
    /// Menu key.
    pub key: String,
    /// Inner HTML of the menu host.
    pub html: String,
}

/// Switch list response.
#[derive(Debug, Serialize)]
pub struct ToggleListResponse {
    /// All switches with their current values.
    pub toggles: Vec<ToggleEntry>,
}

/// Switch update request.
#[derive(Debug, Deserialize)]
pub struct ToggleUpdateRequest {
    /// New value.
    pub value: bool,
}

/// Hotbutton response.
#[derive(Debug, Serialize)]
pub struct HotbuttonResponse {
    /// Button key.
    pub key: String,
    /// Saved config, `None` when the button shows its defaults.
    pub config: Option<HotbuttonConfig>,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Error message.
    pub error: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn not_found(what: &str, key: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(format!("Unknown {what}: {key}"))),
    )
}

/// Keys are short identifiers; anything else is rejected before lookup.
fn validate_key(key: &str) -> Result<&str, ApiError> {
    if key.is_empty() || key.len() > 64 {
        return Err(ApiError::new("Key must be 1-64 characters"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ApiError::with_details(
            "Invalid key",
            "Only letters, digits, '-' and '_' are allowed",
        ));
    }
    Ok(key)
}

fn checked_key(key: &str) -> ApiResult<&str> {
    validate_key(key).map_err(|e| (StatusCode::BAD_REQUEST, Json(e)))
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /health - Health check endpoint.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /nav - The full page.
async fn nav_page(State(state): State<AppState>) -> Html<String> {
    let body = state.lock().html();
    Html(format!(
        "<!DOCTYPE html><title>{APP_NAME}</title>{body}"
    ))
}

/// GET /api/menus - Menus with their visibility and catalog issues.
async fn list_menus(State(state): State<AppState>) -> Json<MenuListResponse> {
    let shell = state.lock();
    let doc = shell.document();
    let menus = shell
        .catalog()
        .menus
        .iter()
        .map(|def| MenuSummary {
            key: def.key.clone(),
            label: def.label.clone(),
            items: def.items.len(),
            enabled: crate::settings::menu_trigger(doc, &def.key)
                .is_some_and(|t| !doc.has_attr(t, "hidden")),
        })
        .collect();
    let issues = shell
        .catalog()
        .validate()
        .iter()
        .map(ToString::to_string)
        .collect();
    Json(MenuListResponse { menus, issues })
}

/// GET /api/menus/{key} - Rendered HTML of one menu.
async fn get_menu(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<MenuHtmlResponse>> {
    let key = checked_key(&key)?;
    let shell = state.lock();
    let host = menu::menu_host(shell.document(), key).ok_or_else(|| not_found("menu", key))?;
    Ok(Json(MenuHtmlResponse {
        key: key.to_string(),
        html: shell.document().inner_html(host),
    }))
}

/// GET /api/toggles - All switches.
async fn list_toggles(State(state): State<AppState>) -> Json<ToggleListResponse> {
    Json(ToggleListResponse {
        toggles: state.lock().toggles().list(),
    })
}

/// PUT /api/toggles/{key} - Flip a switch as a user would.
async fn update_toggle(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<ToggleUpdateRequest>,
) -> ApiResult<Json<ToggleChange>> {
    let key = checked_key(&key)?;
    let change = state
        .lock()
        .set_toggle(key, request.value)
        .ok_or_else(|| not_found("switch", key))?;
    info!("Switch {} set to {}", change.key, change.value);
    Ok(Json(change))
}

fn known_hotbutton(shell: &NavShell, key: &str) -> ApiResult<()> {
    if shell.hotbuttons().node(key).is_some() {
        Ok(())
    } else {
        Err(not_found("hotbutton", key))
    }
}

/// GET /api/hotbuttons/{key} - Saved config.
async fn get_hotbutton(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<HotbuttonResponse>> {
    let key = checked_key(&key)?;
    let shell = state.lock();
    known_hotbutton(&shell, key)?;
    Ok(Json(HotbuttonResponse {
        key: key.to_string(),
        config: load_config(shell.storage(), key),
    }))
}

/// PUT /api/hotbuttons/{key} - Sanitize, save and apply a config.
async fn save_hotbutton(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(config): Json<HotbuttonConfig>,
) -> ApiResult<Json<HotbuttonResponse>> {
    let key = checked_key(&key)?;
    let mut shell = state.lock();
    known_hotbutton(&shell, key)?;
    let saved = shell.set_hotbutton(key, &config).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::with_details(e.user_message(), e.to_string())),
        )
    })?;
    Ok(Json(HotbuttonResponse {
        key: key.to_string(),
        config: saved,
    }))
}

/// DELETE /api/hotbuttons/{key} - Back to defaults.
async fn clear_hotbutton(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    let key = checked_key(&key)?;
    let mut shell = state.lock();
    known_hotbutton(&shell, key)?;
    shell.clear_hotbutton(key);
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    // The preview is meant to run next to a local front-end.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/nav", get(nav_page))
        // Menu endpoints
        .route("/api/menus", get(list_menus))
        .route("/api/menus/{key}", get(get_menu))
        // Switch endpoints
        .route("/api/toggles", get(list_toggles))
        .route("/api/toggles/{key}", axum::routing::put(update_toggle))
        // Hotbutton endpoints
        .route(
            "/api/hotbuttons/{key}",
            get(get_hotbutton).put(save_hotbutton).delete(clear_hotbutton),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the web server.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the server fails to
/// start.
pub async fn run_server(config: Config, addr: SocketAddr) -> anyhow::Result<()> {
    let state = AppState::new(&config)?;
    let app = create_router(state);

    info!("Starting {} preview server on {}", APP_NAME, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_valid() {
        assert!(validate_key("s5").is_ok());
        assert!(validate_key("hb1").is_ok());
        assert!(validate_key("extra-toggle_1").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_paths() {
        assert!(validate_key("../store").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key(&"x".repeat(65)).is_err());
    }
}
