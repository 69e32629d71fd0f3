use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use tracing::error;

/// Error returned by handlers. Rendered as a plain-text body with `code`.
#[derive(Debug)]
pub struct Error {
    pub code: StatusCode,
    pub message: String,
}

impl Error {
    pub fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn server() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.code, self.message).into_response()
    }
}

impl From<(StatusCode, &str)> for Error {
    fn from((code, msg): (StatusCode, &str)) -> Self {
        Self::new(code, msg)
    }
}

impl From<sqlx::error::Error> for Error {
    fn from(err: sqlx::error::Error) -> Self {
        error!("database error: {err}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "DB Error")
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        error!("token signing failed: {err}");
        Self::server()
    }
}

impl From<argon2::password_hash::errors::Error> for Error {
    fn from(err: argon2::password_hash::errors::Error) -> Self {
        error!("password hashing failed: {err}");
        Self::server()
    }
}
