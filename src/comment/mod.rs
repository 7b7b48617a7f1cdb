//! 评论

mod handlers;
pub mod model;
mod repo;
pub mod service;

use axum::{routing::get, Router};

use crate::server::state::AppState;

pub use service::CommentService;

/// `/comments`
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/{id}",
            get(handlers::get_comment)
                .patch(handlers::update_comment)
                .delete(handlers::delete_comment),
        )
}
