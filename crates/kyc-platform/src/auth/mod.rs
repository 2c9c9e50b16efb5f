//! Accounts and bearer-token authentication.
//!
//! Tokens are HS256 JWTs carrying the user id and role. Passwords are stored
//! as `salt$digest` with a per-user random salt. The user directory is a
//! trait so the service can run against in-memory infrastructure in tests
//! and demos.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::AuthConfig;

/// Account roles. Merchants drive the onboarding wizard; reviewers work the
/// decision console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Merchant,
    Reviewer,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Merchant => "merchant",
            Role::Reviewer => "reviewer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "merchant" => Ok(Role::Merchant),
            "reviewer" => Ok(Role::Reviewer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

/// A stored account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Account storage abstraction. Email addresses are unique.
pub trait UserDirectory: Send + Sync {
    fn insert(&self, user: UserRecord) -> Result<UserRecord, DirectoryError>;
    fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, DirectoryError>;
    fn find(&self, id: &str) -> Result<Option<UserRecord>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("email already registered")]
    Conflict,
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// JWT claims: subject, role, expiry.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    exp: i64,
}

/// An authenticated caller, decoded from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub role: Role,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::hours(config.token_ttl_hours),
        }
    }

    pub fn issue(&self, user_id: &str, role: Role) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            role,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenEncoding)
    }

    pub fn verify(&self, token: &str) -> Result<AuthSession, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(AuthSession {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }
}

/// Registration payload. Matches the `POST /api/auth/register` body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

/// Login payload. Matches the `POST /api/auth/login` body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token handed back after registration or login.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub role: Role,
}

const MIN_PASSWORD_LEN: usize = 8;

/// Registration, login, and token verification over a user directory.
pub struct AuthService<U> {
    directory: Arc<U>,
    signer: TokenSigner,
}

impl<U> AuthService<U>
where
    U: UserDirectory,
{
    pub fn new(directory: Arc<U>, signer: TokenSigner) -> Self {
        Self { directory, signer }
    }

    pub fn register(&self, request: RegisterRequest) -> Result<IssuedToken, AuthError> {
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }

        let user = UserRecord {
            id: Uuid::new_v4().to_string(),
            email: request.email,
            full_name: request.full_name,
            password_hash: hash_password(&request.password),
            role: request.role,
            created_at: Utc::now(),
        };

        let stored = self.directory.insert(user).map_err(|err| match err {
            DirectoryError::Conflict => AuthError::EmailTaken,
            other => AuthError::Directory(other),
        })?;

        let token = self.signer.issue(&stored.id, stored.role)?;
        Ok(IssuedToken {
            token,
            role: stored.role,
        })
    }

    pub fn login(&self, request: LoginRequest) -> Result<IssuedToken, AuthError> {
        let user = self
            .directory
            .find_by_email(&request.email)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&request.password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.signer.issue(&user.id, user.role)?;
        Ok(IssuedToken {
            token,
            role: user.role,
        })
    }

    pub fn authorize(&self, token: &str) -> Result<AuthSession, AuthError> {
        self.signer.verify(token)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email already registered")]
    EmailTaken,
    #[error("password must be at least 8 characters")]
    PasswordTooShort,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("token required")]
    TokenRequired,
    #[error("invalid token")]
    InvalidToken,
    #[error("failed to encode token")]
    TokenEncoding,
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Hash a password with a fresh random salt, returning `salt$digest`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{salt}${}", digest_hex(&salt, password))
}

/// Check a password against a stored `salt$digest` pair.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) => digest_hex(salt, password) == expected,
        None => false,
    }
}

fn digest_hex(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
