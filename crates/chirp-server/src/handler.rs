use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chirp_types::{LikeEvent, Liker, NewPost, Post, PostId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::Identity;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Optional; must match the token when present.
    pub user_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct LikeRequest {
    pub post_id: PostId,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub auth: bool,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LikeCount {
    pub post_id: PostId,
    pub count: u64,
}

/// Legacy projection of [`Liker`].
#[derive(Debug, Serialize)]
pub struct LikerName {
    pub username: String,
}

pub async fn info_handler() -> Json<Value> {
    Json(json!({
        "name": "chirp",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check; pings storage.
pub async fn health_handler(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    state.storage.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}

pub async fn signup_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> ServerResult<(StatusCode, Json<Value>)> {
    state.accounts.signup(&body.username, &body.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully." })),
    ))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> ServerResult<Json<LoginResponse>> {
    let (_, token) = state.accounts.login(&body.username, &body.password).await?;
    Ok(Json(LoginResponse { auth: true, token }))
}

pub async fn username_handler(identity: Identity) -> Json<Value> {
    Json(json!({ "username": identity.username }))
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<CreatePostRequest>,
) -> ServerResult<Json<Post>> {
    let author = identity.acting_as(body.user_id)?;
    let post = NewPost::new(author, body.title, body.content);
    post.validate()?;
    let post = state.posts.create_post(post).await?;
    info!(post_id = %post.id, user_id = %author, "post created");
    Ok(Json(post))
}

pub async fn posts_by_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> ServerResult<Json<Vec<Post>>> {
    let posts = state.posts.posts_by_user(user_id).await?;
    if posts.is_empty() {
        return Err(ServerError::NotFound("No posts found for this user".into()));
    }
    Ok(Json(posts))
}

/// Toggle the caller's like on a post.
pub async fn toggle_like_handler(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<LikeRequest>,
) -> ServerResult<Json<LikeEvent>> {
    let user_id = identity.acting_as(body.user_id)?;
    // A token can outlive its user across a storage reset.
    if state.accounts.users().find_by_id(user_id).await?.is_none() {
        return Err(ServerError::UnknownUser(user_id));
    }
    if !state.posts.post_exists(body.post_id).await? {
        return Err(ServerError::UnknownPost(body.post_id));
    }
    Ok(Json(state.likes.toggle(user_id, body.post_id).await?))
}

/// Deactivate the caller's like. Succeeds even when nothing was active.
pub async fn unlike_handler(
    State(state): State<AppState>,
    identity: Identity,
    Path((user_id, post_id)): Path<(UserId, PostId)>,
) -> ServerResult<Json<Value>> {
    let user_id = identity.acting_as(Some(user_id))?;
    state.likes.deactivate(user_id, post_id).await?;
    Ok(Json(json!({ "message": "The like has been removed successfully!" })))
}

pub async fn likers_handler(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
) -> ServerResult<Json<Vec<Liker>>> {
    Ok(Json(state.likes.list_likers(post_id).await?))
}

pub async fn like_count_handler(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
) -> ServerResult<Json<LikeCount>> {
    let count = state.likes.like_count(post_id).await?;
    Ok(Json(LikeCount { post_id, count }))
}

pub async fn liker_names_handler(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
) -> ServerResult<Json<Vec<LikerName>>> {
    let likers = state.likes.list_likers(post_id).await?;
    Ok(Json(
        likers
            .into_iter()
            .map(|liker| LikerName {
                username: liker.username,
            })
            .collect(),
    ))
}
