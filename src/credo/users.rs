//! Credential store core: registration, login and the administrative listing.
//!
//! The store is the single source of truth for email uniqueness. The
//! pre-insert existence check only short-circuits the common case; the unique
//! index on `users.email` is the authoritative guard when two registrations
//! race, and its violation surfaces as [`AuthError::Conflict`].

use crate::credo::password;
use regex::Regex;
use sqlx::{PgPool, Row};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("email is already registered")]
    Conflict,

    #[error("email or password incorrect")]
    InvalidCredentials,

    #[error("password hashing failed")]
    Hash(anyhow::Error),

    #[error("stored credentials are malformed")]
    Corrupt(#[from] hex::FromHexError),

    #[error("store unavailable")]
    Store(#[from] sqlx::Error),
}

/// Account projection safe to return to callers: never carries the
/// password hash or the salt.
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub user_id: Uuid,
    pub email: String,
    pub username: Option<String>,
}

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::Validation(
            "email and password are required".to_string(),
        ));
    }

    if !valid_email(email) {
        return Err(AuthError::Validation("invalid email address".to_string()));
    }

    Ok(())
}

fn validate_password_policy(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < 8 {
        return Err(AuthError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase())
        || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err(AuthError::Validation(
            "password must contain an uppercase letter and a digit".to_string(),
        ));
    }

    Ok(())
}

/// Register a new account and return the store-assigned id.
///
/// No row is written on any failure path.
/// # Errors
/// `Validation` on malformed input, `Conflict` when the email is taken,
/// `Hash`/`Store` on collaborator failures.
#[instrument(skip(pool, password))]
pub async fn register(
    pool: &PgPool,
    email: &str,
    password: &str,
    username: Option<&str>,
) -> Result<Uuid, AuthError> {
    validate_credentials(email, password)?;
    validate_password_policy(password)?;

    // Best-effort early exit; the unique index is the real guard
    if account_exists(pool, email).await? {
        return Err(AuthError::Conflict);
    }

    let salt = password::generate_salt();
    let hash = password::derive(password, &salt).map_err(AuthError::Hash)?;

    let row = sqlx::query(
        "INSERT INTO users (username, email, password_hash, salt, created_at) \
         VALUES ($1, $2, $3, $4, now()) RETURNING id",
    )
    .bind(username)
    .bind(email)
    .bind(hex::encode(hash))
    .bind(hex::encode(salt))
    .fetch_one(pool)
    .await
    .map_err(|error| {
        if matches!(&error, sqlx::Error::Database(db) if db.is_unique_violation()) {
            AuthError::Conflict
        } else {
            AuthError::Store(error)
        }
    })?;

    Ok(row.get("id"))
}

/// Verify credentials and return the account summary.
///
/// An unknown email and a wrong password both fail with the same
/// `InvalidCredentials`; callers cannot tell which factor was wrong.
/// # Errors
/// `Validation` on malformed input, `InvalidCredentials` on rejection,
/// `Corrupt`/`Hash`/`Store` on collaborator failures.
#[instrument(skip(pool, password))]
pub async fn login(pool: &PgPool, email: &str, password: &str) -> Result<AccountSummary, AuthError> {
    validate_credentials(email, password)?;

    let row = match sqlx::query(
        "SELECT id, username, email, password_hash, salt FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    {
        Ok(row) => row,
        Err(sqlx::Error::RowNotFound) => {
            debug!("account not found");

            return Err(AuthError::InvalidCredentials);
        }
        Err(error) => return Err(AuthError::Store(error)),
    };

    let salt = hex::decode(row.get::<String, _>("salt"))?;
    let stored_hash = hex::decode(row.get::<String, _>("password_hash"))?;

    if !password::verify(password, &salt, &stored_hash).map_err(AuthError::Hash)? {
        debug!("password mismatch");

        return Err(AuthError::InvalidCredentials);
    }

    Ok(AccountSummary {
        user_id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
    })
}

/// List every account, excluding hash and salt at the SQL level.
/// # Errors
/// `Store` when the query fails.
#[instrument(skip(pool))]
pub async fn list(pool: &PgPool) -> Result<Vec<AccountSummary>, AuthError> {
    let rows = sqlx::query("SELECT id, username, email FROM users ORDER BY created_at")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| AccountSummary {
            user_id: row.get("id"),
            email: row.get("email"),
            username: row.get("username"),
        })
        .collect())
}

async fn account_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS exists")
        .bind(email)
        .fetch_one(pool)
        .await?;

    Ok(row.get("exists"))
}
