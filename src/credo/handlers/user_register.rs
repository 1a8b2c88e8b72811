use crate::credo::{
    handlers::{bad_request, error_response},
    users,
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, instrument};

// No Debug on the request: the plaintext password must never reach the logs
#[derive(Deserialize)]
pub struct UserRegister {
    email: String,
    password: String,
    username: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct RegisterResponse {
    success: bool,
    message: String,
    #[serde(rename = "insertedId")]
    inserted_id: String,
    display: bool,
}

// axum handler for registration
#[instrument(skip_all)]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Option<Json<UserRegister>>,
) -> Response {
    let user: UserRegister = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("email and password are required"),
    };

    match users::register(&pool, &user.email, &user.password, user.username.as_deref()).await {
        Ok(id) => {
            info!(email = %user.email, "account created");

            (
                StatusCode::CREATED,
                Json(RegisterResponse {
                    success: true,
                    message: "registration successful".to_string(),
                    inserted_id: id.to_string(),
                    display: true,
                }),
            )
                .into_response()
        }
        Err(error) => error_response(&error, "registration failed, try again later"),
    }
}
