//! REST API for the pack planning service.
//!
//! Provides HTTP endpoints for the web UI and other clients.
//! Uses Axum as the web framework and supports CORS.

use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::{Method, StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::config::ApiConfig;
use crate::error::PlanError;
use crate::model::{PackBreakdown, Plan};
use crate::optimizer::{PlanningConfig, optimize_with_config};
use crate::registry::PackSizeRegistry;
use crate::shutdown;

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct ApiState {
    registry: PackSizeRegistry,
    planning: PlanningConfig,
}

impl ApiState {
    pub fn new(registry: PackSizeRegistry, planning: PlanningConfig) -> Self {
        Self { registry, planning }
    }
}

/// Longest time a single request may take before it is answered with 408.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// How long open connections may drain after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>pack-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
</html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded Web Assets (HTML, CSS, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Request body for the optimize endpoint.
///
/// Pack sizes come from the server's registry; a `pack_sizes` field is rejected.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
#[schema(example = json!({ "items_ordered": 501 }))]
pub struct OptimizeRequest {
    pub items_ordered: i64,
}

/// Request body for replacing the registry's pack sizes.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
#[schema(example = json!({ "pack_sizes": [250, 500, 1000, 2000, 5000] }))]
pub struct PackSizesRequest {
    pub pack_sizes: Vec<i64>,
}

/// Current pack sizes, sorted descending.
#[derive(Debug, Serialize, ToSchema)]
pub struct PackSizesResponse {
    pub pack_sizes: Vec<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

/// Failure of a single request.
#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    InvalidJson(#[from] JsonRejection),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("optimization worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidJson(err) => {
                warn!("Rejected request body: {}", err.body_text());
                error_response(StatusCode::BAD_REQUEST, "Invalid JSON data", err.body_text())
            }
            ApiError::Plan(err) if err.is_client_error() => {
                warn!("Rejected input: {}", err);
                error_response(StatusCode::BAD_REQUEST, "Invalid input data", err.to_string())
            }
            ApiError::Plan(err) => {
                error!("Packing table inconsistent: {}", err);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Optimization failed",
                    "unable to optimize pack breakdown",
                )
            }
            ApiError::Worker(err) => {
                error!("Optimization worker failed: {}", err);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Optimization failed",
                    "unable to optimize pack breakdown",
                )
            }
        }
    }
}

/// Failure to start or run the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("could not bind API server to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("API server terminated with an error: {0}")]
    Serve(#[source] std::io::Error),
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_health, handle_optimize, handle_get_pack_sizes, handle_put_pack_sizes),
    components(
        schemas(
            OptimizeRequest,
            PackSizesRequest,
            PackSizesResponse,
            HealthResponse,
            ErrorResponse,
            Plan,
            PackBreakdown
        )
    ),
    tags((name = "packing", description = "Endpoints for pack planning"))
)]
struct ApiDoc;

/// Builds the router with all API, documentation and web UI routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        // API endpoints
        .route("/api/health", get(handle_health))
        .route("/api/optimize", post(handle_optimize))
        .route(
            "/api/pack-sizes",
            get(handle_get_pack_sizes).put(handle_put_pack_sizes),
        )
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Web-UI (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .method_not_allowed_fallback(handle_method_not_allowed)
        .layer(request_timeout_layer(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn request_timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Starts the API server and serves until Ctrl+C or SIGTERM.
pub async fn start_api_server(config: ApiConfig, state: ApiState) -> Result<(), ServerError> {
    let app = build_router(state);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let display_host = config.display_host();
    info!("🚀 Server running on http://{}:{}", display_host, config.port());
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 API Endpoints: GET /api/health, POST /api/optimize, GET|PUT /api/pack-sizes");
    info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    let signal = async {
        if let Err(err) = shutdown::listen().await {
            error!("Graceful shutdown unavailable: {}", err);
            std::future::pending::<()>().await;
        }
    };
    serve_until(listener, app, signal, SHUTDOWN_GRACE).await?;

    info!("Server stopped");
    Ok(())
}

/// Serves `app` until `signal` resolves, then waits at most `grace` for open
/// connections before returning.
async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    grace: Duration,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            info!("🛑 Shutdown requested, draining open connections");
            let _ = signalled_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    let drain_deadline = async move {
        if signalled_rx.await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = &mut server => result.map_err(ServerError::Serve)?,
        () = drain_deadline => {
            warn!("⚠️ Connections still open after {:?}, stopping without them", grace);
        }
    }
    Ok(())
}

/// Handler for GET /api/health.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "packing"
)]
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Handler for POST /api/optimize.
///
/// Plans the order against a snapshot of the registry's pack sizes. The table
/// is filled on the blocking pool.
#[utoipa::path(
    post,
    path = "/api/optimize",
    request_body = OptimizeRequest,
    responses(
        (status = 200, description = "Optimal pack breakdown", body = Plan),
        (status = BAD_REQUEST, description = "Invalid request or order too large", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Inconsistent packing table", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_optimize(
    State(state): State<ApiState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Result<Json<Plan>, ApiError> {
    let Json(request) = payload?;
    let pack_sizes = state.registry.raw_pack_sizes();
    let planning = state.planning;

    info!(
        "📥 New optimize request: {} items, {} pack sizes",
        request.items_ordered,
        pack_sizes.len()
    );
    let plan = tokio::task::spawn_blocking(move || {
        optimize_with_config(request.items_ordered, &pack_sizes, planning)
    })
    .await??;
    info!(
        "📦 Result: {} items in {} packs (overfill {})",
        plan.total_items,
        plan.total_packs,
        plan.overfill()
    );

    Ok(Json(plan))
}

/// Handler for GET /api/pack-sizes.
#[utoipa::path(
    get,
    path = "/api/pack-sizes",
    responses((status = 200, description = "Configured pack sizes", body = PackSizesResponse)),
    tag = "packing"
)]
async fn handle_get_pack_sizes(State(state): State<ApiState>) -> Json<PackSizesResponse> {
    Json(PackSizesResponse {
        pack_sizes: state.registry.pack_sizes(),
    })
}

/// Handler for PUT /api/pack-sizes.
///
/// Replaces the whole set; later optimize requests use the new sizes.
#[utoipa::path(
    put,
    path = "/api/pack-sizes",
    request_body = PackSizesRequest,
    responses(
        (status = 200, description = "Stored pack sizes", body = PackSizesResponse),
        (status = BAD_REQUEST, description = "Invalid pack sizes", body = ErrorResponse)
    ),
    tag = "packing"
)]
async fn handle_put_pack_sizes(
    State(state): State<ApiState>,
    payload: Result<Json<PackSizesRequest>, JsonRejection>,
) -> Result<Json<PackSizesResponse>, ApiError> {
    let Json(request) = payload?;
    let pack_sizes = state.registry.set_pack_sizes(&request.pack_sizes)?;
    info!("🔧 Pack sizes updated: {:?}", pack_sizes);
    Ok(Json(PackSizesResponse { pack_sizes }))
}

/// Answers a known path requested with an unsupported method.
async fn handle_method_not_allowed(method: Method, uri: Uri) -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not allowed",
        format!("{} is not supported on {}", method, uri.path()),
    )
}

/// Serves the index.html main page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
