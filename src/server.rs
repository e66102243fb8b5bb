//! Content API server.
//!
//! Exposes the node store over JSON HTTP for the reader and admin UIs.
//! One content endpoint dispatches on its query string, mirroring how the
//! UI layer asks tree-shaped questions.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/api/content?path=a/b/c` | Resolve a slug path; returns `{content, children}` |
//! | `GET`    | `/api/content?parentId=<id>` | Ordered published children of a node |
//! | `GET`    | `/api/content?type=<t>` | All published nodes of one type |
//! | `GET`    | `/api/content?search=<q>` | Substring search, capped at the configured limit |
//! | `GET`    | `/api/content` | Every published node |
//! | `POST`   | `/api/content` | Create a node |
//! | `PUT`    | `/api/content` | Update a node by id |
//! | `DELETE` | `/api/content?id=<id>[&force=true]` | Delete; `force` cascades |
//! | `GET`    | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "has_children", "message": "content abc has children" }, "hasChildren": true }
//! ```
//!
//! Error codes: `bad_request` (400), `has_children` (400), `not_found`
//! (404), `duplicate_slug` (409), `internal` (500). The `hasChildren` flag
//! appears only on the delete guard so the admin UI can offer a cascade.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the reader UI is served
//! from a separate origin.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::error::StoreError;
use crate::icon;
use crate::models::{ContentNode, NewNode, NodePatch, NodeType};
use crate::resolve::{self, ContentWithChildren};
use crate::search;
use crate::store::NodeStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: NodeStore,
}

/// Starts the content API server. Binds to `[server].bind` and runs until
/// the process is terminated. The database must already be initialized
/// (`minbar init`).
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let state = AppState {
        config: Arc::new(config.clone()),
        store: NodeStore::connect(config).await?,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route(
            "/api/content",
            get(handle_get)
                .post(handle_create)
                .put(handle_update)
                .delete(handle_delete),
        )
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("content API listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
    #[serde(rename = "hasChildren", skip_serializing_if = "Option::is_none")]
    has_children: Option<bool>,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    has_children: bool,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> AppError {
        AppError {
            status: StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: message.into(),
            has_children: false,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
            has_children: self.has_children.then_some(true),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::Validation(_) => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "bad_request",
                message,
                has_children: false,
            },
            StoreError::DuplicateSlug { .. } => AppError {
                status: StatusCode::CONFLICT,
                code: "duplicate_slug",
                message,
                has_children: false,
            },
            StoreError::NotFound(_) => AppError {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message,
                has_children: false,
            },
            StoreError::HasChildren { .. } => AppError {
                status: StatusCode::BAD_REQUEST,
                code: "has_children",
                message,
                has_children: true,
            },
            // Store failures stay generic on the wire.
            StoreError::Db(_) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal",
                message: "content store unavailable".to_string(),
                has_children: false,
            },
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Json<serde_json::Value>, AppError> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|e| AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal",
            message: e.to_string(),
            has_children: false,
        })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check used by load balancers and monitoring.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /api/content ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentQuery {
    search: Option<String>,
    path: Option<String>,
    parent_id: Option<String>,
    #[serde(rename = "type")]
    node_type: Option<String>,
}

/// Read dispatch: `search` wins over `path`, then `parentId`, then `type`,
/// then the full published listing.
async fn handle_get(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Some(term) = query.search {
        let hits =
            search::search_nodes(&state.store, &term, state.config.search.result_limit).await?;
        return to_json(&hits);
    }

    if let Some(raw_path) = query.path {
        let slugs = resolve::split_path(&raw_path);
        let mut page = resolve::content_with_children(&state.store, &slugs).await?;
        decorate_page_icons(&state.store, &mut page).await;
        return to_json(&page);
    }

    if let Some(parent_id) = query.parent_id {
        let mut children = state.store.children_of(&parent_id).await?;
        decorate_icons(&state.store, &mut children).await;
        return to_json(&children);
    }

    if let Some(type_text) = query.node_type {
        let node_type = NodeType::parse(&type_text)
            .ok_or_else(|| AppError::bad_request(format!("unknown type: {type_text}")))?;
        let mut nodes = state.store.by_type(node_type).await?;
        decorate_icons(&state.store, &mut nodes).await;
        return to_json(&nodes);
    }

    let mut nodes = state.store.all_published().await?;
    decorate_icons(&state.store, &mut nodes).await;
    to_json(&nodes)
}

// ============ POST /api/content ============

async fn handle_create(
    State(state): State<AppState>,
    Json(input): Json<NewNode>,
) -> Result<(StatusCode, Json<ContentNode>), AppError> {
    let node = state.store.create(input).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

// ============ PUT /api/content ============

async fn handle_update(
    State(state): State<AppState>,
    Json(patch): Json<NodePatch>,
) -> Result<Json<ContentNode>, AppError> {
    let id = patch
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("missing content id"))?;
    let node = state.store.update(&id, patch).await?;
    Ok(Json(node))
}

// ============ DELETE /api/content ============

#[derive(Deserialize)]
struct DeleteQuery {
    id: Option<String>,
    #[serde(default)]
    force: bool,
}

async fn handle_delete(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("missing content id"))?;
    let removed = state.store.delete(&id, query.force).await?;
    Ok(Json(serde_json::json!({
        "message": "content deleted successfully",
        "removed": removed,
    })))
}

// ============ Icon decoration ============

/// Fills derived icons on a resolved page. The node resolves against the
/// nearest explicit icon on its ancestor chain; its children's chain passes
/// through the node itself, so they inherit its explicit icon first and the
/// same ancestor icon otherwise.
async fn decorate_page_icons(store: &NodeStore, page: &mut ContentWithChildren) {
    let inherited = icon::inherited_icon(store, page.content.parent_id.as_deref()).await;
    let child_inherited = page.content.icon.clone().or_else(|| inherited.clone());
    page.content.icon = Some(icon::resolve_icon(&page.content, inherited.as_deref()));
    for child in &mut page.children {
        child.icon = Some(icon::resolve_icon(child, child_inherited.as_deref()));
    }
}

/// Fills derived icons on a flat listing: each node resolves against the
/// nearest explicit icon on its own ancestor chain.
async fn decorate_icons(store: &NodeStore, nodes: &mut [ContentNode]) {
    for node in nodes.iter_mut() {
        let inherited = icon::inherited_icon(store, node.parent_id.as_deref()).await;
        node.icon = Some(icon::resolve_icon(node, inherited.as_deref()));
    }
}
