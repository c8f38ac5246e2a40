use axum::extract::State;
use axum::http::{header, Method};
use axum::middleware;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::InternalErrorDetail;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all chirp endpoints.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handler::info_handler))
        .route("/health", get(handler::health_handler))
        .route("/signup", post(handler::signup_handler))
        .route("/login", post(handler::login_handler))
        .route("/username", get(handler::username_handler))
        .route("/posts", post(handler::create_post_handler))
        .route("/posts/user/:user_id", get(handler::posts_by_user_handler))
        .route("/likes", post(handler::toggle_like_handler))
        .route("/likes/:user_id/:post_id", put(handler::unlike_handler))
        .route("/likes/post/:post_id", get(handler::likers_handler))
        .route("/likes/post/:post_id/count", get(handler::like_count_handler))
        .route("/likes/posts/:post_id", get(handler::liker_names_handler))
        .layer(middleware::map_response_with_state(
            state.clone(),
            reveal_internal_errors,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Swap the generic 500 body for the raw error when configured to.
async fn reveal_internal_errors(State(state): State<AppState>, mut response: Response) -> Response {
    let Some(detail) = response.extensions_mut().remove::<InternalErrorDetail>() else {
        return response;
    };
    if !state.expose_internal_errors {
        return response;
    }
    (response.status(), Json(json!({ "error": detail.0 }))).into_response()
}
