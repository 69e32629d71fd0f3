use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::{
    models::{
        dto::{LoginInfo, LoginResponse},
        Error, TokenClaim,
    },
    AppState,
};

#[derive(OpenApi)]
#[openapi(paths(login_handler))]
/// Defines the OpenAPI spec for authentication endpoints
pub struct AuthApi;

/// Used to group authentication endpoints together in the OpenAPI documentation
pub const AUTH_API_GROUP: &str = "AUTH";

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new().route("/login", post(login_handler))
}

/// Exchanges credentials for a bearer token.
/// Unknown emails and wrong passwords get the same `{success:false}` answer.
#[utoipa::path(
    post,
    path = "/login",
    tag = AUTH_API_GROUP,
    request_body = LoginInfo,
    responses(
        (status = 200, description = "Login attempted; check `success`", body = LoginResponse),
        (status = 500, description = "DB Error"),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginInfo>,
) -> Result<Json<LoginResponse>, Error> {
    let user = match state.db.get_user_by_email(&body.email).await? {
        Some(user) if user.verify_password(&body.password) => user,
        _ => {
            debug!("failed login for {}", body.email);
            return Ok(Json(LoginResponse::failed()));
        }
    };

    let token = TokenClaim::for_user(&user).encode(&state.config.jwt_secret)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(LoginResponse::succeeded(token, &user)))
}
