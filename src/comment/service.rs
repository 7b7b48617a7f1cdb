//! 评论服务

use std::sync::Arc;

use chrono::{SubsecRound, Utc};

use crate::common::Paginated;
use crate::db::Database;
use crate::error::AppError;
use crate::oplog::{LogData, OpLogService, OpLogger};
use crate::server::scope::RequestScope;
use crate::user::model::User;

use super::model::{Comment, CommentListQuery, CreateCommentRequest, UpdateCommentRequest};
use super::repo::{self, CommentFilter};

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("comment {} not found", id))
}

pub struct CommentService {
    db: Database,
    oplog: OpLogger,
}

impl CommentService {
    pub fn new(db: Database, oplogs: Arc<OpLogService>) -> Self {
        Self {
            db,
            oplog: OpLogger::new("comment", oplogs),
        }
    }

    pub async fn get(&self, scope: &RequestScope, id: i64) -> Result<Comment, AppError> {
        scope
            .timed("db", self.db.call(move |conn| repo::find(conn, id)))
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn list(
        &self,
        scope: &RequestScope,
        query: CommentListQuery,
    ) -> Result<Paginated<Comment>, AppError> {
        let page = query.page();
        page.validate().map_err(AppError::BadRequest)?;
        let (Some(biz_type), Some(biz_id)) = (
            query.biz_type.filter(|s| !s.is_empty()),
            query.biz_id.filter(|s| !s.is_empty()),
        ) else {
            return Err(AppError::bad_request("biz_type and biz_id are required"));
        };

        let filter = CommentFilter {
            biz_type,
            biz_id,
            author: query.author,
            parent_id: query.parent_id,
        };
        let comments = scope
            .timed("db", self.db.call(move |conn| repo::list(conn, &filter, page)))
            .await?;
        Ok(comments)
    }

    /// 已登录时作者为当前用户，否则取请求中的 author
    pub async fn create(
        &self,
        scope: &RequestScope,
        req: CreateCommentRequest,
    ) -> Result<Comment, AppError> {
        req.validate().map_err(AppError::BadRequest)?;
        let author = match (scope.user_email(), req.author.as_deref()) {
            (Some(email), _) => email.to_string(),
            (None, Some(author)) if !author.trim().is_empty() => author.trim().to_string(),
            _ => return Err(AppError::bad_request("author is required")),
        };

        if let Some(parent_id) = req.parent_id {
            let parent = self.get(scope, parent_id).await.map_err(|e| match e {
                AppError::NotFound(_) => {
                    AppError::BadRequest(format!("parent comment {} not found", parent_id))
                }
                other => other,
            })?;
            if parent.biz_type != req.biz_type || parent.biz_id != req.biz_id {
                return Err(AppError::bad_request(
                    "parent comment belongs to another target",
                ));
            }
        }

        let now = Utc::now().trunc_subsecs(3);
        let draft = Comment {
            id: 0,
            created_at: now,
            updated_at: now,
            biz_type: req.biz_type,
            biz_id: req.biz_id,
            content: req.content,
            author,
            parent_id: req.parent_id,
        };
        let comment = scope
            .timed("db", self.db.call(move |conn| repo::insert(conn, &draft)))
            .await?;

        self.oplog
            .success(scope, LogData::new(comment.id, "create").new_data(&comment))
            .await;
        Ok(comment)
    }

    /// 仅作者本人可修改
    pub async fn update(
        &self,
        scope: &RequestScope,
        user: &User,
        id: i64,
        req: UpdateCommentRequest,
    ) -> Result<Comment, AppError> {
        req.validate().map_err(AppError::BadRequest)?;
        let old = self.get(scope, id).await?;
        ensure_author(&old, user)?;

        let mut comment = old.clone();
        comment.content = req.content;
        comment.updated_at = Utc::now().trunc_subsecs(3);

        let record = comment.clone();
        let result = scope
            .timed("db", self.db.call(move |conn| repo::update_content(conn, &record)))
            .await;
        match result {
            Ok(true) => {}
            Ok(false) => return Err(not_found(id)),
            Err(e) => {
                self.oplog
                    .failure(
                        scope,
                        LogData::new(id, "update")
                            .description(e.to_string())
                            .old_data(&old),
                    )
                    .await;
                return Err(e.into());
            }
        }

        self.oplog
            .success(
                scope,
                LogData::new(id, "update").old_data(&old).new_data(&comment),
            )
            .await;
        Ok(comment)
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
                self.oplog
                    .failure(
                        scope,
                        LogData::new(id, "delete")
                            .description(e.to_string())
                            .old_data(&old),
                    )
                    .await;
                return Err(e.into());
            }
        }

        self.oplog
            .success(scope, LogData::new(id, "delete").old_data(&old))
            .await;
        Ok(())
    }
}

fn ensure_author(comment: &Comment, user: &User) -> Result<(), AppError> {
    if comment.author != user.email {
        return Err(AppError::Forbidden(
            "only the author can modify this comment".to_string(),
        ));
    }
    Ok(())
}
