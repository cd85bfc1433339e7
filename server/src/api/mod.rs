//! HTTP routes
//!
//! Every JSON response uses the same envelope: `{"Data": ...}` on success
//! and `{"Error": "..."}` on failure.

mod requests;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use blogstore_core::{BlogComment, BlogPost, BlogStore};

use crate::error::ApiError;
pub use requests::{NewCommentRequest, NewPostRequest};

/// Common response type that can be either data or an error
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    /// Successful result
    Success {
        /// Response payload
        #[serde(rename = "Data")]
        data: T,
    },
    /// Failure description
    Error {
        /// Client-facing message
        #[serde(rename = "Error")]
        error: String,
    },
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::Success { data }))
}

/// Shared application state
pub struct AppState {
    /// Posts and comments
    pub blog: BlogStore,
}

impl AppState {
    /// Wrap a blog store for use by the router
    pub fn new(blog: BlogStore) -> Arc<Self> {
        Arc::new(AppState { blog })
    }
}

/// Id of a newly created resource
#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    /// Assigned id
    #[serde(rename = "ID")]
    pub id: String,
}

/// Ids of a collection
#[derive(Debug, Serialize)]
pub struct IdsResponse {
    /// Ids in primary key order
    #[serde(rename = "IDs")]
    pub ids: Vec<String>,
}

/// Store summary for `/status`
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusResponse {
    /// Service status
    pub status: &'static str,
    /// Crate version
    pub version: &'static str,
    /// Version of the current snapshot
    pub snapshot_version: u64,
    /// Comments whose post is missing; zero unless the store is corrupt
    pub orphaned_comments: usize,
}

/// Create the API router with the specified state
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status))
        .route("/blog", get(list_posts).post(create_post))
        .route("/blog/:id", get(get_post).delete(delete_post))
        .route("/blog/:id/comments", get(list_comments).post(create_comment))
        .route(
            "/blog/:id/comments/:comment_id",
            get(get_comment).delete(delete_comment),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run a store write off the async executor; writes may wait for the writer slot
async fn blocking<T, F>(state: &Arc<AppState>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&BlogStore) -> blogstore_core::Result<T> + Send + 'static,
{
    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || op(&state.blog))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(result?)
}

async fn health_check() -> &'static str {
    "server_up"
}

async fn status(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let orphans = state.blog.check_integrity()?;
    ok(StatusResponse {
        status: "operational",
        version: env!("CARGO_PKG_VERSION"),
        snapshot_version: state.blog.version(),
        orphaned_comments: orphans.len(),
    })
}

async fn list_posts(State(state): State<Arc<AppState>>) -> ApiResult<IdsResponse> {
    let ids = state.blog.list_post_ids()?;
    tracing::info!(count = ids.len(), "Listed posts");
    ok(IdsResponse { ids })
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewPostRequest>, JsonRejection>,
) -> ApiResult<CreatedResponse> {
    let Json(request) = payload?;
    let fields = request.validate()?;

    let id = blocking(&state, move |blog| blog.create_post(fields)).await?;
    tracing::info!(post_id = %id, "Created post");
    ok(CreatedResponse { id })
}

async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<BlogPost> {
    let post = state.blog.get_post(&id)?;
    tracing::info!(post_id = %id, "Got post");
    ok(post)
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<&'static str> {
    let post_id = id.clone();
    let removed = blocking(&state, move |blog| blog.delete_post(&post_id)).await?;
    tracing::info!(post_id = %id, comments = removed, "Deleted post");
    ok("OK")
}

async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<IdsResponse> {
    let ids = state.blog.list_comment_ids(&id)?;
    tracing::info!(post_id = %id, count = ids.len(), "Listed comments");
    ok(IdsResponse { ids })
}

async fn create_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<NewCommentRequest>, JsonRejection>,
) -> ApiResult<CreatedResponse> {
    let Json(request) = payload?;
    let fields = request.validate(&id)?;

    let post_id = id.clone();
    let comment_id = blocking(&state, move |blog| blog.create_comment(&post_id, fields)).await?;
    tracing::info!(post_id = %id, comment_id = %comment_id, "Created comment");
    ok(CreatedResponse { id: comment_id })
}

async fn get_comment(
    State(state): State<Arc<AppState>>,
    Path((id, comment_id)): Path<(String, String)>,
) -> ApiResult<BlogComment> {
    let comment = state.blog.get_comment(&id, &comment_id)?;
    tracing::info!(post_id = %id, comment_id = %comment_id, "Got comment");
    ok(comment)
}

async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path((id, comment_id)): Path<(String, String)>,
) -> ApiResult<&'static str> {
    let (post_id, target) = (id.clone(), comment_id.clone());
    blocking(&state, move |blog| blog.delete_comment(&post_id, &target)).await?;
    tracing::info!(post_id = %id, comment_id = %comment_id, "Deleted comment");
    ok("OK")
}
