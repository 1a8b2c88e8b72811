//! Integration tests against a live PostgreSQL instance.
//!
//! Set `CREDO_TEST_DSN` to a reachable database to run these; without it every
//! test is a no-op so the suite stays green on machines without Postgres.

use credo::credo::users::{self, AuthError};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

async fn test_pool() -> Option<PgPool> {
    let Ok(dsn) = std::env::var("CREDO_TEST_DSN") else {
        eprintln!("CREDO_TEST_DSN not set, skipping");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&dsn)
        .await
        .expect("failed to connect to CREDO_TEST_DSN");

    sqlx::raw_sql(include_str!(
        "../migrations/20260101000000_create_users.sql"
    ))
    .execute(&pool)
    .await
    .expect("failed to apply schema");

    Some(pool)
}

fn unique_email() -> String {
    format!("user-{}@test.example", Uuid::new_v4())
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let email = unique_email();
    let id = users::register(&pool, &email, "Abcdefg1", Some("alice"))
        .await
        .unwrap();

    let account = users::login(&pool, &email, "Abcdefg1").await.unwrap();

    assert_eq!(account.user_id, id);
    assert_eq!(account.email, email);
    assert_eq!(account.username.as_deref(), Some("alice"));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let email = unique_email();
    users::register(&pool, &email, "Abcdefg1", None)
        .await
        .unwrap();

    let wrong_password = users::login(&pool, &email, "WrongPass1").await.unwrap_err();
    let unknown_email = users::login(&pool, &unique_email(), "Abcdefg1")
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    assert!(matches!(unknown_email, AuthError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let email = unique_email();
    users::register(&pool, &email, "Abcdefg1", None)
        .await
        .unwrap();

    let err = users::register(&pool, &email, "Zyxwvut2", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Conflict));

    // the failed attempt wrote nothing
    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn concurrent_registrations_resolve_to_one_winner() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let email = unique_email();
    let (first, second) = tokio::join!(
        users::register(&pool, &email, "Abcdefg1", None),
        users::register(&pool, &email, "Zyxwvut2", None),
    );

    let outcomes = [first, second];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();

    assert_eq!(winners, 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(AuthError::Conflict))));
}

#[tokio::test]
async fn listing_excludes_credentials() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let email = unique_email();
    let id = users::register(&pool, &email, "Abcdefg1", Some("bob"))
        .await
        .unwrap();

    let accounts = users::list(&pool).await.unwrap();
    let entry = accounts
        .iter()
        .find(|a| a.user_id == id)
        .expect("registered account missing from listing");

    assert_eq!(entry.email, email);
    assert_eq!(entry.username.as_deref(), Some("bob"));
}

#[tokio::test]
async fn validation_failures_write_nothing() {
    let Some(pool) = test_pool().await else {
        return;
    };

    for (email, password) in [
        ("bad-email", "Abcdefg1"),
        ("a@b.com", "short1A"),
        ("a@b.com", "abcdefg1"),
        ("a@b.com", "Abcdefgh"),
    ] {
        let err = users::register(&pool, email, password, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    let count: i64 = sqlx::query_scalar("SELECT count(*) FROM users WHERE email = 'a@b.com'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
