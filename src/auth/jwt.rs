//! JWT Token 管理
//!
//! 签名密钥由配置的 secret 经 SHA256 派生

use std::sync::Arc;

use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// JWT Claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// 用户邮箱
    pub sub: String,
    /// 签发时间 (Unix timestamp)
    pub iat: usize,
    /// 过期时间 (Unix timestamp)
    pub exp: usize,
}

fn derive_secret_key(secret: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.finalize().to_vec()
}

#[derive(Clone)]
pub struct JwtManager {
    key: Arc<Vec<u8>>,
    expiry_secs: u64,
}

impl JwtManager {
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        Self {
            key: Arc::new(derive_secret_key(secret)),
            expiry_secs,
        }
    }

    /// 为用户签发 Token，返回 `(token, expires_in)`
    pub fn generate_token(&self, email: &str) -> Result<(String, u64)> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_secs();

        let claims = Claims {
            sub: email.to_string(),
            iat: now as usize,
            exp: (now + self.expiry_secs) as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.key),
        )?;

        Ok((token, self.expiry_secs))
    }

    /// 校验 Token（签名、过期时间）
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.key),
            &Validation::default(),
        )
        .map_err(|e| anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_verify_token() {
        let jwt = JwtManager::new("test-secret", 3600);
        let (token, expires_in) = jwt.generate_token("alice@example.com").unwrap();
        assert!(!token.is_empty());
        assert_eq!(expires_in, 3600);

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let (token, _) = JwtManager::new("one", 3600)
            .generate_token("alice@example.com")
            .unwrap();
        assert!(JwtManager::new("two", 3600).verify_token(&token).is_err());
    }

    #[test]
    fn test_verify_invalid_token() {
        let jwt = JwtManager::new("test-secret", 3600);
        assert!(jwt.verify_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_derive_secret_key_length() {
        assert_eq!(derive_secret_key("k"), derive_secret_key("k"));
        assert_eq!(derive_secret_key("k").len(), 32);
    }
}
