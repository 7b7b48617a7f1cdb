use axum::{routing::get, Router};

use super::handlers::list_oplogs;
use crate::server::state::AppState;

/// `/system/oplogs`
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_oplogs))
}
