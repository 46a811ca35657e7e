//! User identity: registration, credential checks and bearer tokens
//!
//! Uniqueness is enforced on email, mobile and Aadhaar number, each via its
//! own index key. Tokens are JWTs carrying the user id; expiry is checked
//! when the token is presented at the API boundary, never inside the
//! workflow.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::{Storage, StorageError};

pub type Result<T> = std::result::Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user with this {0} already exists")]
    Duplicate(&'static str),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("user not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Stored user record; the password hash never leaves this module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub aadhaar_no: String,
    pub address: String,
    password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// What the API returns about a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
}

impl From<&User> for UserProfile {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            mobile: u.mobile.clone(),
        }
    }
}

/// Registration payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub password: String,
    pub aadhaar_no: String,
    #[serde(default)]
    pub address: String,
}

/// JWT claims: subject is the user id
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

fn user_key(id: &str) -> Vec<u8> {
    format!("user/{}", id).into_bytes()
}

fn index_key(field: &str, value: &str) -> Vec<u8> {
    format!("user_{}/{}", field, value).into_bytes()
}

/// Identity manager backed by the shared storage
pub struct IdentityManager {
    storage: Arc<dyn Storage>,
    jwt_secret: Vec<u8>,
    token_ttl_secs: i64,
}

impl IdentityManager {
    pub fn new(storage: Arc<dyn Storage>, jwt_secret: &str, token_ttl_secs: i64) -> Self {
        Self {
            storage,
            jwt_secret: jwt_secret.as_bytes().to_vec(),
            token_ttl_secs,
        }
    }

    fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| IdentityError::Hashing(e.to_string()))
    }

    fn verify_password(password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    async fn ensure_unique(&self, field: &'static str, value: &str) -> Result<()> {
        if self.storage.exists(&index_key(field, value)).await? {
            return Err(IdentityError::Duplicate(field));
        }
        Ok(())
    }

    /// Register a new user and hand back a signed token for the session
    pub async fn register(&self, new: NewUser) -> Result<(String, User)> {
        if new.password.len() < 6 {
            return Err(IdentityError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }
        for (field, value) in [
            ("email", new.email.as_str()),
            ("mobile", new.mobile.as_str()),
            ("aadhaar", new.aadhaar_no.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(IdentityError::Validation(format!("{} is required", field)));
            }
            self.ensure_unique(field, value).await?;
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            mobile: new.mobile,
            email: new.email,
            aadhaar_no: new.aadhaar_no,
            address: new.address,
            password_hash: Self::hash_password(&new.password)?,
            created_at: Utc::now(),
        };

        let bytes = serde_json::to_vec(&user)
            .map_err(|e| IdentityError::Validation(e.to_string()))?;
        self.storage.put(&user_key(&user.id), &bytes).await?;
        for (field, value) in [
            ("email", user.email.as_str()),
            ("mobile", user.mobile.as_str()),
            ("aadhaar", user.aadhaar_no.as_str()),
        ] {
            self.storage
                .put(&index_key(field, value), user.id.as_bytes())
                .await?;
        }

        info!("registered user {} ({})", user.id, user.mobile);
        let token = self.issue_token(&user.id)?;
        Ok((token, user))
    }

    /// Check mobile + password and issue a token
    pub async fn login(&self, mobile: &str, password: &str) -> Result<(String, User)> {
        if mobile.is_empty() || password.is_empty() {
            return Err(IdentityError::Validation(
                "please provide mobile number and password".into(),
            ));
        }
        let id_bytes = self
            .storage
            .get(&index_key("mobile", mobile))
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;
        let id = String::from_utf8_lossy(&id_bytes).to_string();
        let user = self.find(&id).await?.ok_or(IdentityError::InvalidCredentials)?;

        if !Self::verify_password(password, &user.password_hash) {
            return Err(IdentityError::InvalidCredentials);
        }
        let token = self.issue_token(&user.id)?;
        Ok((token, user))
    }

    pub async fn find(&self, id: &str) -> Result<Option<User>> {
        match self.storage.get(&user_key(id)).await? {
            Some(bytes) => {
                let user = serde_json::from_slice(&bytes)
                    .map_err(|e| IdentityError::Validation(e.to_string()))?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    fn issue_token(&self, user_id: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.token_ttl_secs,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.jwt_secret),
        )
        .map_err(|_| IdentityError::InvalidToken)
    }

    /// Validate a bearer token and return the user id it carries
    pub fn verify_token(&self, token: &str) -> Result<String> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.jwt_secret),
            &Validation::default(),
        )
        .map_err(|_| IdentityError::InvalidToken)?;
        Ok(data.claims.sub)
    }

    /// Mock OTP check; real delivery is out of scope and the stub accepts
    /// exactly one code
    pub fn verify_otp(&self, otp: &str) -> bool {
        otp == "123456"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn manager() -> IdentityManager {
        IdentityManager::new(Arc::new(MemoryStorage::new()), "test-secret", 3600)
    }

    fn new_user(mobile: &str, email: &str, aadhaar: &str) -> NewUser {
        NewUser {
            name: "Asha Rao".into(),
            mobile: mobile.into(),
            email: email.into(),
            password: "s3cret-pass".into(),
            aadhaar_no: aadhaar.into(),
            address: "Pune".into(),
        }
    }

    #[tokio::test]
    async fn register_login_roundtrip() {
        let mgr = manager();
        let (_, user) = mgr
            .register(new_user("9876543210", "asha@example.in", "430156789012"))
            .await
            .unwrap();

        let (token, logged_in) = mgr.login("9876543210", "s3cret-pass").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(mgr.verify_token(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn duplicate_mobile_rejected() {
        let mgr = manager();
        mgr.register(new_user("9876543210", "a@example.in", "430156789012"))
            .await
            .unwrap();
        let err = mgr
            .register(new_user("9876543210", "b@example.in", "981234567890"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::Duplicate("mobile")));
    }

    #[tokio::test]
    async fn wrong_password_rejected() {
        let mgr = manager();
        mgr.register(new_user("9876543210", "a@example.in", "430156789012"))
            .await
            .unwrap();
        let err = mgr.login("9876543210", "wrong").await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));
    }

    #[tokio::test]
    async fn expired_token_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let mgr = IdentityManager::new(storage, "test-secret", -120);
        let (token, _) = mgr
            .register(new_user("9876543210", "a@example.in", "430156789012"))
            .await
            .unwrap();
        assert!(matches!(
            mgr.verify_token(&token),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn otp_stub_accepts_fixed_code() {
        let mgr = manager();
        assert!(mgr.verify_otp("123456"));
        assert!(!mgr.verify_otp("000000"));
    }
}
