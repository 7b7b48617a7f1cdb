//! 用户

mod handlers;
pub mod model;
mod repo;
pub mod service;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::server::state::AppState;

pub use service::UserService;

/// `/users`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/{email}",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/{email}/password", patch(handlers::change_password))
}
