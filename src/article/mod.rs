//! 文章

mod handlers;
pub mod model;
mod repo;
pub mod service;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

pub use service::ArticleService;

/// `/articles`
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route(
            "/{id}",
            get(handlers::get_article)
                .patch(handlers::update_article)
                .delete(handlers::delete_article),
        )
        .route("/{id}/like", post(handlers::like_article))
}
