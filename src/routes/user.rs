use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get},
    Extension, Json, Router,
};
use tracing::info;
use utoipa::OpenApi;

use crate::{
    config::AdminSeed,
    database::is_unique_violation,
    models::{
        dto::{NewUser, UserResponse},
        user::hash_password,
        Error, Role, TokenClaim, User,
    },
    AppState,
};

use super::middlewares::{admin_guard, auth_guard};

#[derive(OpenApi)]
#[openapi(paths(list_users_handler, create_user_handler, delete_user_handler))]
/// Defines the OpenAPI spec for user endpoints
pub struct UsersApi;

/// Used to group user endpoints together in the OpenAPI documentation
pub const USER_API_GROUP: &str = "USER";

/// Builds a router for user administration. Every route is admin-only.
pub fn user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route("/users/:id", delete(delete_user_handler))
        .route_layer(middleware::from_fn(admin_guard))
        .route_layer(middleware::from_fn_with_state(state, auth_guard))
}

/// Creates the configured admin account unless a user with that email exists
pub async fn seed_admin(state: &AppState, seed: &AdminSeed) -> Result<(), Error> {
    let email = seed.email.trim().to_ascii_lowercase();
    if state.db.get_user_by_email(&email).await?.is_some() {
        return Ok(());
    }
    let hashed_password = hash_password(&seed.password)?;
    let admin = state
        .db
        .create_user(&seed.name, &email, &hashed_password, Role::Admin)
        .await?;
    info!(user_id = admin.id, "created admin account {email}");
    Ok(())
}

#[utoipa::path(
    get,
    path = "/users",
    tag = USER_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 200, description = "All users ordered by name", body = [UserResponse]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, Error> {
    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = USER_API_GROUP,
    request_body = NewUser,
    security(
        ("bearerAuth" = [])
    ),
    responses(
        (status = 201, description = "User successfully created", body = UserResponse),
        (status = 400, description = "Email already exists"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
    )
)]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    let email = body.email.trim().to_ascii_lowercase();
    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(Error::new(StatusCode::BAD_REQUEST, "Email already exists"));
    }

    let hashed_password = hash_password(&body.password)?;
    let user: User = state
        .db
        .create_user(&body.name, &email, &hashed_password, body.role)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                Error::new(StatusCode::BAD_REQUEST, "Email already exists")
            } else {
                Error::from(err)
            }
        })?;
    info!(user_id = user.id, role = %body.role, "user created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = USER_API_GROUP,
    security(
        ("bearerAuth" = [])
    ),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User and their records deleted"),
        (status = 400, description = "Admins cannot delete themselves"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<TokenClaim>,
    Path(id): Path<i32>,
) -> Result<StatusCode, Error> {
    if id == caller.id {
        return Err(Error::new(
            StatusCode::BAD_REQUEST,
            "Cannot delete your own account",
        ));
    }
    if !state.db.delete_user(id).await? {
        return Err(Error::new(StatusCode::NOT_FOUND, "User not found"));
    }
    info!(user_id = id, deleted_by = caller.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
