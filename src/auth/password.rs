//! 密码哈希（bcrypt，在阻塞线程池中执行）

use anyhow::Result;

pub async fn hash_password(password: String) -> Result<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await??;
    Ok(hash)
}

/// 校验密码；哈希格式错误视为不匹配
pub async fn verify_password(password: String, hash: String) -> Result<bool> {
    let matched = tokio::task::spawn_blocking(move || {
        bcrypt::verify(password, &hash).unwrap_or_else(|e| {
            tracing::warn!("密码哈希格式错误: {}", e);
            false
        })
    })
    .await?;
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("s3cret!".to_string()).await.unwrap();
        assert_ne!(hash, "s3cret!");
        assert!(verify_password("s3cret!".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_does_not_match() {
        assert!(!verify_password("x".into(), "not-a-hash".into()).await.unwrap());
    }
}
