//! REST API server module
//!
//! Serves the single-page front-end and the JSON endpoints it drives:
//! submitting a URL, polling progress, and collecting the finished file.

use crate::{Config, Result, VideoFetcher};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Page
/// - `GET /` - HTML form that submits a URL and follows its progress
///
/// ## Downloads
/// - `POST /download` - Accept a URL (form field `url`), returns a task id
/// - `GET /progress/:task_id` - Poll a task
/// - `GET /file/:task_id` - Stream the finished file (once)
/// - `HEAD /file/:task_id` - Same headers, leaves the task in place
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
///
/// When an API key is configured, everything except `/` and `/health`
/// requires it.
pub fn create_router(fetcher: Arc<VideoFetcher>, config: Arc<Config>) -> Router {
    let state = AppState::new(fetcher);

    let protected = Router::new()
        .route("/download", post(routes::start_download))
        .route("/progress/:task_id", get(routes::get_progress))
        .route(
            "/file/:task_id",
            get(routes::get_file).head(routes::head_file),
        )
        .route("/openapi.json", get(routes::openapi_spec));

    let protected = if config.server.api.api_key.is_some() {
        protected.route_layer(middleware::from_fn_with_state(
            config.server.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        protected
    };

    let router = Router::new()
        .route("/", get(routes::index))
        .route("/health", get(routes::health_check))
        .merge(protected);

    // Swagger UI gets its own copy of the document; /openapi.json is already taken
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// "*" (or an empty list) allows any origin; otherwise only the listed
/// origins are allowed. Methods and headers are unrestricted.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until SIGINT/SIGTERM. Download workers still running at that point
/// are not waited for.
///
/// # Example
///
/// ```no_run
/// use vidfetch::{Config, VideoFetcher};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let fetcher = Arc::new(VideoFetcher::new((*config).clone()).await?);
///
/// vidfetch::api::start_api_server(fetcher, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(fetcher: Arc<VideoFetcher>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    serve(listener, fetcher, config, crate::shutdown_signal()).await
}

/// Serve the API on an already-bound listener until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    fetcher: Arc<VideoFetcher>,
    config: Arc<Config>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(fetcher, config);

    if let Ok(address) = listener.local_addr() {
        tracing::info!(address = %address, "API server listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
