use crate::credo::{handlers::error_response, users};
use axum::{
    extract::Extension,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

#[derive(Serialize, Debug)]
pub struct UserEntry {
    #[serde(rename = "userId")]
    user_id: String,
    email: String,
    username: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct UserList {
    users: Vec<UserEntry>,
}

// axum handler for the administrative account listing
#[instrument(skip_all)]
pub async fn list_users(pool: Extension<PgPool>) -> Response {
    match users::list(&pool).await {
        Ok(accounts) => Json(UserList {
            users: accounts
                .into_iter()
                .map(|account| UserEntry {
                    user_id: account.user_id.to_string(),
                    email: account.email,
                    username: account.username,
                })
                .collect(),
        })
        .into_response(),
        Err(error) => error_response(&error, "failed to list users"),
    }
}
