//! Token-protected probe endpoints

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::state::AppState;

use super::auth::{RequireAdmin, RequireAuth, RequireUser};

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /protected - any authenticated principal
async fn protected(RequireAuth(user): RequireAuth) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("You are authorized, {}!", user.username),
    })
}

/// GET /admin - administrators only
async fn admin(admin: RequireAdmin) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!(
            "Hello Admin {}, you have access to this endpoint.",
            admin.user().username
        ),
    })
}

/// GET /user - standard users only
async fn user(user: RequireUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!(
            "Hello User {}, you have access to this endpoint.",
            user.user().username
        ),
    })
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/protected", get(protected))
        .route("/admin", get(admin))
        .route("/user", get(user))
}
