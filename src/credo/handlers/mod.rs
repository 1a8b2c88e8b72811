pub mod health;
pub use self::health::health;

pub mod user_register;
pub use self::user_register::register;

pub mod user_login;
pub use self::user_login::login;

pub mod user_list;
pub use self::user_list::list_users;

// common response plumbing for the handlers
use crate::credo::users::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;

#[derive(Serialize, Debug)]
pub(crate) struct ErrorBody {
    pub error: String,
}

pub(crate) fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Map a core error to the wire format. Internal failures are logged and
/// replaced with `internal_message` so store details never leak.
pub(crate) fn error_response(error: &AuthError, internal_message: &str) -> Response {
    let status = match error {
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::Conflict => StatusCode::CONFLICT,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Hash(_) | AuthError::Corrupt(_) | AuthError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("{error:?}");

        internal_message.to_string()
    } else {
        error.to_string()
    };

    (status, Json(ErrorBody { error: message })).into_response()
}
