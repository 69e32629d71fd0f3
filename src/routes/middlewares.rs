use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

use crate::{
    models::{Error, TokenClaim},
    AppState,
};

/// Rejects requests without a valid bearer token.
/// On success the decoded [TokenClaim] is available to handlers as an extension.
pub async fn auth_guard(
    State(state): State<Arc<AppState>>,
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        debug!("request to {} without bearer token", req.uri().path());
        return Err(Error::unauthorized("Unauthorized"));
    };

    let claim = TokenClaim::decode(bearer.token(), &state.config.jwt_secret).map_err(|err| {
        debug!("rejected token: {err}");
        Error::unauthorized("Invalid token")
    })?;

    req.extensions_mut().insert(claim);
    Ok(next.run(req).await)
}

/// Lets only admins through. Must be layered inside [auth_guard].
pub async fn admin_guard(
    Extension(claim): Extension<TokenClaim>,
    req: Request,
    next: Next,
) -> Result<Response, Error> {
    if !claim.is_admin() {
        debug!(user_id = claim.id, "non-admin denied {}", req.uri().path());
        return Err(Error::forbidden());
    }
    Ok(next.run(req).await)
}
