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
use tracing::{debug, instrument};

// No Debug on the request: the plaintext password must never reach the logs
#[derive(Deserialize)]
pub struct UserLogin {
    email: String,
    password: String,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    success: bool,
    message: String,
    user: LoginUser,
}

#[derive(Serialize, Debug)]
pub struct LoginUser {
    username: Option<String>,
    email: String,
    #[serde(rename = "userId")]
    user_id: String,
}

// axum handler for login
#[instrument(skip_all)]
pub async fn login(pool: Extension<PgPool>, payload: Option<Json<UserLogin>>) -> Response {
    let user: UserLogin = match payload {
        Some(Json(payload)) => payload,
        None => return bad_request("email and password are required"),
    };

    match users::login(&pool, &user.email, &user.password).await {
        Ok(account) => {
            debug!("login successful");

            (
                StatusCode::OK,
                Json(LoginResponse {
                    success: true,
                    message: "login successful".to_string(),
                    user: LoginUser {
                        username: account.username,
                        email: account.email,
                        user_id: account.user_id.to_string(),
                    },
                }),
            )
                .into_response()
        }
        Err(error) => error_response(&error, "login failed, try again later"),
    }
}
