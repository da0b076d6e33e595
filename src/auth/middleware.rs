//! Authentication middleware that resolves bearer tokens through the
//! identity provider and injects the user ID into the request.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use crate::{AppState, Error, auth::provider::IdentityProvider};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Resolves bearer tokens to user identifiers.
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            identity_provider: state.identity_provider.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token.
/// The user ID is placed into the request and the request executed normally
/// if the token resolves, otherwise a 401 is returned before any side effect.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match TypedHeader::<Authorization<Bearer>>::from_request_parts(&mut parts, &state)
        .await
    {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(_) => return Error::Unauthorized.into_response(),
    };

    let user_id = match state.identity_provider.resolve(bearer.token()) {
        Ok(Some(user_id)) => user_id,
        Ok(None) => return Error::Unauthorized.into_response(),
        Err(error) => {
            tracing::error!("Could not resolve bearer token: {error}");
            return error.into_response();
        }
    };

    parts.extensions.insert(user_id);
    next.run(Request::from_parts(parts, body)).await
}
