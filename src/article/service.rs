//! 文章服务

use std::sync::Arc;

use chrono::{SubsecRound, Utc};

use crate::common::Paginated;
use crate::db::Database;
use crate::error::AppError;
use crate::oplog::{LogData, OpLogService, OpLogger};
use crate::server::scope::RequestScope;
use crate::user::model::User;

use super::model::{
    Article, ArticleListQuery, CreateArticleRequest, LikeAction, UpdateArticleRequest,
};
use super::repo::{self, ArticleFilter};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("article {} not found", id))
}

pub struct ArticleService {
    db: Database,
    oplog: OpLogger,
}

impl ArticleService {
    pub fn new(db: Database, oplogs: Arc<OpLogService>) -> Self {
        Self {
            db,
            oplog: OpLogger::new("article", oplogs),
        }
    }

    pub async fn get(&self, scope: &RequestScope, id: i64) -> Result<Article, AppError> {
        scope
            .timed("db", self.db.call(move |conn| repo::find(conn, id)))
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn list(
        &self,
        scope: &RequestScope,
        query: ArticleListQuery,
    ) -> Result<Paginated<Article>, AppError> {
        let page = query.page();
        page.validate().map_err(AppError::BadRequest)?;
        let filter = ArticleFilter {
            search: query.search,
            author: query.author,
            category: query.category,
        };
        let articles = scope
            .timed("db", self.db.call(move |conn| repo::list(conn, &filter, page)))
            .await?;
        Ok(articles)
    }

    pub async fn create(
        &self,
        scope: &RequestScope,
        author: &User,
        req: CreateArticleRequest,
    ) -> Result<Article, AppError> {
        req.validate().map_err(AppError::BadRequest)?;

        let now = Utc::now().trunc_subsecs(3);
        let draft = Article {
            id: 0,
            created_at: now,
            updated_at: now,
            title: req.title.trim().to_string(),
            content: req.content,
            author: author.email.clone(),
            category: req.category.filter(|c| !c.is_empty()),
            tags: req.tags.filter(|t| !t.is_empty()),
            likes: 0,
            dislikes: 0,
        };
        let article = scope
            .timed("db", self.db.call(move |conn| repo::insert(conn, &draft)))
            .await?;

        self.oplog
            .success(scope, LogData::new(article.id, "create").new_data(&article))
            .await;
        tracing::info!("创建文章 #{}: {}", article.id, article.title);
        Ok(article)
    }

    /// 仅作者本人可修改
    pub async fn update(
        &self,
        scope: &RequestScope,
        user: &User,
        id: i64,
        req: UpdateArticleRequest,
    ) -> Result<Article, AppError> {
        req.validate().map_err(AppError::BadRequest)?;
        let old = self.get(scope, id).await?;
        ensure_author(&old, user)?;

        let mut article = old.clone();
        req.apply(&mut article);
        article.updated_at = Utc::now().trunc_subsecs(3);

        let record = article.clone();
        let result = scope
            .timed("db", self.db.call(move |conn| repo::update(conn, &record)))
            .await;
        match result {
            Ok(true) => {}
            Ok(false) => return Err(not_found(id)),
            Err(e) => {
                self.fail(scope, LogData::new(id, "update").old_data(&old), &e)
                    .await;
                return Err(e.into());
            }
        }

        self.oplog
            .success(
                scope,
                LogData::new(id, "update").old_data(&old).new_data(&article),
            )
            .await;
        Ok(article)
    }

    /// 仅作者本人可删除
    pub async fn delete(&self, scope: &RequestScope, user: &User, id: i64) -> Result<(), AppError> {
        let old = self.get(scope, id).await?;
        ensure_author(&old, user)?;

        let result = scope
            .timed("db", self.db.call(move |conn| repo::delete(conn, id)))
            .await;
        match result {
            Ok(true) => {}
            Ok(false) => return Err(not_found(id)),
            Err(e) => {
                self.fail(scope, LogData::new(id, "delete").old_data(&old), &e)
                    .await;
                return Err(e.into());
            }
        }

        self.oplog
            .success(scope, LogData::new(id, "delete").old_data(&old))
            .await;
        tracing::info!("删除文章 #{}", id);
        Ok(())
    }

    /// 点赞/点踩
    pub async fn react(
        &self,
        scope: &RequestScope,
        id: i64,
        action: LikeAction,
    ) -> Result<Article, AppError> {
        let old = self.get(scope, id).await?;
        let article = scope
            .timed("db", self.db.call(move |conn| repo::react(conn, id, action)))
            .await?
            .ok_or_else(|| not_found(id))?;

        self.oplog
            .success(
                scope,
                LogData::new(id, action.as_str())
                    .old_data(&old)
                    .new_data(&article),
            )
            .await;
        Ok(article)
    }

    async fn fail(&self, scope: &RequestScope, data: LogData, error: &anyhow::Error) {
        self.oplog
            .failure(scope, data.description(error.to_string()))
            .await;
    }
}

fn ensure_author(article: &Article, user: &User) -> Result<(), AppError> {
    if article.author != user.email {
        return Err(AppError::Forbidden(
            "only the author can modify this article".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PageQuery;
    use crate::oplog::model::ObjectInfo;
    use crate::oplog::SqliteOpLogStore;

    fn setup() -> (ArticleService, Arc<OpLogService>) {
        let db = Database::open_in_memory().unwrap();
        let oplogs = Arc::new(OpLogService::new(Arc::new(SqliteOpLogStore::new(db.clone()))));
        (ArticleService::new(db, oplogs.clone()), oplogs)
    }

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            email: email.into(),
            name: "Tester".into(),
            birthdate: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn scope_for(user: &User) -> RequestScope {
        RequestScope {
            user: Some(user.clone()),
            client_ip: Some("127.0.0.1".into()),
            timing: None,
        }
    }

    fn create_req(title: &str) -> CreateArticleRequest {
        CreateArticleRequest {
            title: title.into(),
            content: "body".into(),
            category: None,
            tags: None,
        }
    }

    #[tokio::test]
    async fn test_only_author_can_update() {
        let (service, _) = setup();
        let ann = user("ann@x.io");
        let bob = user("bob@x.io");
        let article = service
            .create(&scope_for(&ann), &ann, create_req("Hello"))
            .await
            .unwrap();

        let denied = service
            .update(
                &scope_for(&bob),
                &bob,
                article.id,
                UpdateArticleRequest {
                    title: Some("Hijacked".into()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        let updated = service
            .update(
                &scope_for(&ann),
                &ann,
                article.id,
                UpdateArticleRequest {
                    title: Some("Hello again".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.content, "body");

        assert!(matches!(
            service.delete(&scope_for(&bob), &bob, article.id).await,
            Err(AppError::Forbidden(_))
        ));
        service.delete(&scope_for(&ann), &ann, article.id).await.unwrap();
        assert!(matches!(
            service.get(&RequestScope::default(), article.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_repeated_likes_collapse_in_oplog() {
        let (service, oplogs) = setup();
        let ann = user("ann@x.io");
        let scope = scope_for(&ann);
        let article = service.create(&scope, &ann, create_req("Hello")).await.unwrap();

        // 点赞后取消，快照相同的事件合并
        for _ in 0..2 {
            service.react(&scope, article.id, LikeAction::Like).await.unwrap();
            service.react(&scope, article.id, LikeAction::Unlike).await.unwrap();
        }
        let after = service.get(&scope, article.id).await.unwrap();
        assert_eq!(after.likes, 0);

        let logs = oplogs
            .list(
                ObjectInfo::new("article", article.id.to_string()),
                PageQuery::default(),
            )
            .await
            .unwrap();
        let summary: Vec<_> = logs
            .items
            .iter()
            .map(|l| (l.operation.as_str(), l.times))
            .collect();
        assert_eq!(summary, vec![("create", 1), ("like", 2), ("unlike", 2)]);
        assert!(logs.items.iter().all(|l| l.user.as_deref() == Some("ann@x.io")));
    }

    #[tokio::test]
    async fn test_react_missing_article() {
        let (service, _) = setup();
        let result = service
            .react(&RequestScope::default(), 42, LikeAction::Like)
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
