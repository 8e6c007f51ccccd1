//! The HTTP surface: a single static landing page.
//!
//! One `axum` router with two routes: `/` renders the `hello.html` template
//! through `tera`, and `/health` answers plainly for liveness probes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use storefront_core::logging::request_span;
use storefront_core::Settings;
use tera::Tera;

/// The built-in landing page, used when no template directory is configured.
const HELLO_TEMPLATE: &str = include_str!("../templates/hello.html");

/// Shared state for the HTTP handlers.
pub struct AppState {
    /// The template engine.
    pub tera: Tera,
    /// The greeting rendered on the landing page.
    pub site_name: String,
}

/// Builds the template engine from the configured directory, falling back to
/// the compiled-in template when the directory has no `hello.html`.
pub fn build_templates(settings: &Settings) -> Result<Tera, tera::Error> {
    let glob = format!("{}/**/*.html", settings.templates_dir.display());
    let mut tera = Tera::new(&glob).unwrap_or_default();
    if !tera.get_template_names().any(|name| name == "hello.html") {
        tera.add_raw_template("hello.html", HELLO_TEMPLATE)?;
    }
    Ok(tera)
}

/// Builds the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/health", get(health))
        .with_state(state)
}

/// Renders the landing page.
async fn hello(State(state): State<Arc<AppState>>) -> Result<Html<String>, (StatusCode, String)> {
    let request_id = uuid::Uuid::new_v4().to_string();
    let span = request_span(&request_id);
    let _guard = span.enter();

    let mut context = tera::Context::new();
    context.insert("name", &state.site_name);

    match state.tera.render("hello.html", &context) {
        Ok(body) => {
            tracing::info!(bytes = body.len(), "rendered landing page");
            Ok(Html(body))
        }
        Err(e) => {
            tracing::error!(error = %e, "template rendering failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "template rendering failed".to_string(),
            ))
        }
    }
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> Arc<AppState> {
        let settings = Settings::default();
        Arc::new(AppState {
            tera: build_templates(&settings).unwrap(),
            site_name: settings.site_name,
        })
    }

    #[test]
    fn test_build_templates_has_hello() {
        let settings = Settings {
            templates_dir: "/nonexistent".into(),
            ..Settings::default()
        };
        let tera = build_templates(&settings).unwrap();
        assert!(tera.get_template_names().any(|n| n == "hello.html"));
    }

    #[test]
    fn test_hello_template_renders_name() {
        let state = state();
        let mut context = tera::Context::new();
        context.insert("name", "Storefront");
        let body = state.tera.render("hello.html", &context).unwrap();
        assert!(body.contains("Hello from Storefront"));
    }

    #[tokio::test]
    async fn test_hello_handler() {
        let response = hello(State(state())).await.unwrap();
        assert!(response.0.contains("Hello from Storefront"));
    }

    #[tokio::test]
    async fn test_health_handler() {
        assert_eq!(health().await, "ok");
    }

    #[test]
    fn test_router_builds() {
        let _router = build_router(state());
    }
}
