//! 共享状态

use std::sync::Arc;

use crate::article::ArticleService;
use crate::auth::JwtManager;
use crate::comment::CommentService;
use crate::db::Database;
use crate::model::config::Config;
use crate::oplog::{OpLogService, SqliteOpLogStore};
use crate::user::UserService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub jwt: JwtManager,
    pub oplogs: Arc<OpLogService>,
    pub users: Arc<UserService>,
    pub articles: Arc<ArticleService>,
    pub comments: Arc<CommentService>,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let oplogs = Arc::new(OpLogService::new(Arc::new(SqliteOpLogStore::new(
            db.clone(),
        ))));
        Self::with_oplogs(config, db, oplogs)
    }

    pub fn with_oplogs(config: Config, db: Database, oplogs: Arc<OpLogService>) -> Self {
        let jwt = JwtManager::new(&config.auth.secret, config.auth.duration_secs);
        Self {
            config: Arc::new(config),
            jwt,
            users: Arc::new(UserService::new(db.clone(), oplogs.clone())),
            articles: Arc::new(ArticleService::new(db.clone(), oplogs.clone())),
            comments: Arc::new(CommentService::new(db, oplogs.clone())),
            oplogs,
        }
    }
}
