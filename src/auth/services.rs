use std::fmt;

use tracing::{info, warn};

use crate::{
    auth::{
        claims::Claims,
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking, DUMMY_HASH},
        repo::{InsertError, UserStore},
        repo_types::{NewUser, User},
    },
    error::{ApiError, MISSING_CREDENTIALS},
};

/// Username and password that passed presence checks.
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Absent, null and empty fields are all rejected.
pub fn require_credentials(
    username: Option<String>,
    password: Option<String>,
) -> Result<Credentials, ApiError> {
    match (username, password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok(Credentials { username, password })
        }
        _ => Err(ApiError::Validation(MISSING_CREDENTIALS.into())),
    }
}

/// A user together with a freshly issued session token.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub token: String,
}

pub async fn register(
    users: &dyn UserStore,
    keys: &JwtKeys,
    creds: Credentials,
) -> Result<Session, ApiError> {
    // Fast path; `insert` below is what actually enforces uniqueness.
    if users.find_by_username(&creds.username).await?.is_some() {
        warn!(username = %creds.username, "username already registered");
        return Err(username_taken());
    }

    let password_hash = hash_password_blocking(creds.password).await?;

    let user = users
        .insert(NewUser {
            username: creds.username,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            InsertError::UsernameTaken(username) => {
                warn!(%username, "username taken during insert");
                username_taken()
            }
            InsertError::Other(e) => ApiError::Internal(e),
        })?;

    let token = keys.sign(&user)?;
    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(Session { user, token })
}

pub async fn login(
    users: &dyn UserStore,
    keys: &JwtKeys,
    creds: Credentials,
) -> Result<Session, ApiError> {
    let Some(user) = users.find_by_username(&creds.username).await? else {
        // Burn the same Argon2 work as a real mismatch.
        verify_password_blocking(creds.password, DUMMY_HASH.to_string()).await?;
        warn!(username = %creds.username, "login unknown username");
        return Err(ApiError::Authentication);
    };

    if !verify_password_blocking(creds.password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Authentication);
    }

    let token = keys.sign(&user)?;
    info!(user_id = user.id, username = %user.username, "user logged in");
    Ok(Session { user, token })
}

/// Re-reads the record behind verified claims.
pub async fn current_user(users: &dyn UserStore, claims: &Claims) -> Result<User, ApiError> {
    users.find_by_id(claims.id).await?.ok_or_else(|| {
        warn!(user_id = claims.id, "token refers to missing user");
        ApiError::NotFound("User not found.".into())
    })
}

fn username_taken() -> ApiError {
    ApiError::Conflict("Username already exists.".into())
}
