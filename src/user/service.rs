//! 用户服务

use std::sync::Arc;

use chrono::{SubsecRound, Utc};

use crate::auth::password::{hash_password, verify_password};
use crate::common::Paginated;
use crate::db::Database;
use crate::error::AppError;
use crate::oplog::{LogData, OpLogService, OpLogger};
use crate::server::scope::RequestScope;

use super::model::{
    validate_password, ChangePasswordRequest, CreateUserRequest, LoginRequest, UpdateUserRequest,
    User, UserListQuery,
};
use super::repo;

const INVALID_CREDENTIALS: &str = "invalid email or password";

fn not_found(email: &str) -> AppError {
    AppError::NotFound(format!("user {} not found", email))
}

pub struct UserService {
    db: Database,
    oplog: OpLogger,
}

impl UserService {
    pub fn new(db: Database, oplogs: Arc<OpLogService>) -> Self {
        Self {
            db,
            oplog: OpLogger::new("user", oplogs),
        }
    }

    /// 认证中间件使用，不计时
    pub async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let email = email.to_string();
        let record = self
            .db
            .call(move |conn| repo::find_by_email(conn, &email))
            .await?;
        Ok(record.map(|r| r.user))
    }

    pub async fn login(&self, scope: &RequestScope, req: LoginRequest) -> Result<User, AppError> {
        let email = req.email.trim().to_lowercase();
        let record = scope
            .timed("db", self.db.call(move |conn| repo::find_by_email(conn, &email)))
            .await?;
        let Some(record) = record else {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };
        let Some(hash) = record.password else {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };
        if !verify_password(req.password, hash).await? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        tracing::info!("用户登录: {}", record.user.email);
        Ok(record.user)
    }

    pub async fn get(&self, scope: &RequestScope, email: &str) -> Result<User, AppError> {
        let key = email.to_string();
        scope
            .timed("db", self.db.call(move |conn| repo::find_by_email(conn, &key)))
            .await?
            .map(|r| r.user)
            .ok_or_else(|| not_found(email))
    }

    pub async fn list(
        &self,
        scope: &RequestScope,
        query: UserListQuery,
    ) -> Result<Paginated<User>, AppError> {
        let page = query.page();
        page.validate().map_err(AppError::BadRequest)?;
        let emails = query.email_list();
        let search = query.search;
        let users = scope
            .timed(
                "db",
                self.db
                    .call(move |conn| repo::list(conn, search.as_deref(), &emails, page)),
            )
            .await?;
        Ok(users)
    }

    pub async fn create(
        &self,
        scope: &RequestScope,
        req: CreateUserRequest,
    ) -> Result<User, AppError> {
        req.validate().map_err(AppError::BadRequest)?;

        let now = Utc::now().trunc_subsecs(3);
        let user = User {
            email: req.email.trim().to_lowercase(),
            name: req.name.trim().to_string(),
            birthdate: req.birthdate,
            created_at: now,
            updated_at: now,
        };
        let hash = hash_password(req.password).await?;

        let record = user.clone();
        let inserted = scope
            .timed("db", self.db.call(move |conn| repo::insert(conn, &record, &hash)))
            .await?;
        if !inserted {
            return Err(AppError::Conflict(format!(
                "user {} already exists",
                user.email
            )));
        }

        self.oplog
            .success(scope, LogData::new(&user.email, "create").new_data(&user))
            .await;
        tracing::info!("创建用户: {}", user.email);
        Ok(user)
    }

    pub async fn update(
        &self,
        scope: &RequestScope,
        email: &str,
        req: UpdateUserRequest,
    ) -> Result<User, AppError> {
        req.validate().map_err(AppError::BadRequest)?;
        let old = self.get(scope, email).await?;

        let mut user = old.clone();
        if let Some(name) = req.name {
            user.name = name.trim().to_string();
        }
        if let Some(birthdate) = req.birthdate {
            user.birthdate = Some(birthdate).filter(|b| !b.is_empty());
        }
        user.updated_at = Utc::now().trunc_subsecs(3);

        let record = user.clone();
        let result = scope
            .timed("db", self.db.call(move |conn| repo::update_profile(conn, &record)))
            .await;
        match result {
            Ok(true) => {}
            Ok(false) => return Err(not_found(email)),
            Err(e) => {
                self.oplog
                    .failure(
                        scope,
                        LogData::new(email, "update")
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
                LogData::new(email, "update").old_data(&old).new_data(&user),
            )
            .await;
        Ok(user)
    }

    /// 修改密码，需校验旧密码
    pub async fn change_password(
        &self,
        scope: &RequestScope,
        email: &str,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        validate_password(&req.new_password).map_err(AppError::BadRequest)?;

        let key = email.to_string();
        let record = scope
            .timed("db", self.db.call(move |conn| repo::find_by_email(conn, &key)))
            .await?
            .ok_or_else(|| not_found(email))?;

        let matched = match record.password {
            Some(hash) => verify_password(req.old_password, hash).await?,
            None => false,
        };
        if !matched {
            self.oplog
                .failure(
                    scope,
                    LogData::new(email, "change_password").description("old password mismatch"),
                )
                .await;
            return Err(AppError::Unauthorized("old password is incorrect".to_string()));
        }

        let hash = hash_password(req.new_password).await?;
        let key = email.to_string();
        let now = Utc::now().trunc_subsecs(3);
        scope
            .timed(
                "db",
                self.db
                    .call(move |conn| repo::update_password(conn, &key, &hash, &now)),
            )
            .await?;

        self.oplog
            .success(scope, LogData::new(email, "change_password"))
            .await;
        Ok(())
    }

    pub async fn delete(&self, scope: &RequestScope, email: &str) -> Result<(), AppError> {
        let old = self.get(scope, email).await?;
        let key = email.to_string();
        let deleted = scope
            .timed("db", self.db.call(move |conn| repo::delete(conn, &key)))
            .await?;
        if !deleted {
            return Err(not_found(email));
        }

        self.oplog
            .success(scope, LogData::new(email, "delete").old_data(&old))
            .await;
        tracing::info!("删除用户: {}", email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PageQuery;
    use crate::oplog::model::{ObjectInfo, OpResult};
    use crate::oplog::SqliteOpLogStore;

    fn setup() -> (UserService, Arc<OpLogService>) {
        let db = Database::open_in_memory().unwrap();
        let oplogs = Arc::new(OpLogService::new(Arc::new(SqliteOpLogStore::new(db.clone()))));
        (UserService::new(db, oplogs.clone()), oplogs)
    }

    fn create_req(email: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.into(),
            name: "Ann".into(),
            password: "secret1".into(),
            birthdate: None,
        }
    }

    #[tokio::test]
    async fn test_create_login_and_conflict() {
        let (service, _) = setup();
        let scope = RequestScope::default();
        let user = service.create(&scope, create_req("Ann@X.io")).await.unwrap();
        assert_eq!(user.email, "ann@x.io");

        let dup = service.create(&scope, create_req("ann@x.io")).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        let logged_in = service
            .login(
                &scope,
                LoginRequest {
                    email: "ann@x.io".into(),
                    password: "secret1".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(logged_in, user);

        let wrong = service
            .login(
                &scope,
                LoginRequest {
                    email: "ann@x.io".into(),
                    password: "nope".into(),
                },
            )
            .await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_change_password_checks_old_password() {
        let (service, oplogs) = setup();
        let scope = RequestScope::default();
        service.create(&scope, create_req("ann@x.io")).await.unwrap();

        let rejected = service
            .change_password(
                &scope,
                "ann@x.io",
                ChangePasswordRequest {
                    old_password: "wrong1".into(),
                    new_password: "another1".into(),
                },
            )
            .await;
        assert!(matches!(rejected, Err(AppError::Unauthorized(_))));

        service
            .change_password(
                &scope,
                "ann@x.io",
                ChangePasswordRequest {
                    old_password: "secret1".into(),
                    new_password: "another1".into(),
                },
            )
            .await
            .unwrap();

        let logs = oplogs
            .list(ObjectInfo::new("user", "ann@x.io"), PageQuery::default())
            .await
            .unwrap();
        let operations: Vec<_> = logs
            .items
            .iter()
            .map(|l| (l.operation.as_str(), l.result))
            .collect();
        assert_eq!(
            operations,
            vec![
                ("create", OpResult::Success),
                ("change_password", OpResult::Failure),
                ("change_password", OpResult::Success),
            ]
        );
        // 快照不含密码哈希
        assert!(!logs.items[0].new_data.as_deref().unwrap().contains("password"));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (service, _) = setup();
        let scope = RequestScope::default();
        service.create(&scope, create_req("ann@x.io")).await.unwrap();

        let updated = service
            .update(
                &scope,
                "ann@x.io",
                UpdateUserRequest {
                    name: Some("Anna".into()),
                    birthdate: Some("1990-01-01".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Anna");
        assert_eq!(service.get(&scope, "ann@x.io").await.unwrap(), updated);

        service.delete(&scope, "ann@x.io").await.unwrap();
        assert!(matches!(
            service.get(&scope, "ann@x.io").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(&scope, "ann@x.io").await,
            Err(AppError::NotFound(_))
        ));
    }
}
