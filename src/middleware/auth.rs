use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{extract_token, AuthError, TokenVerifier};
use crate::database::models::UserId;
use crate::error::ApiError;

/// Authenticated caller, inserted into request extensions by `jwt_auth_middleware`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
}

/// JWT authentication middleware. Runs before every protected handler and
/// short-circuits with 401 when the credential does not verify.
pub async fn jwt_auth_middleware(
    State(verifier): State<Arc<TokenVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = authenticate(&verifier, request.headers())?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

fn authenticate(verifier: &TokenVerifier, headers: &HeaderMap) -> Result<UserId, AuthError> {
    let header = match headers.get(AUTHORIZATION) {
        Some(value) => value.to_str().map_err(|_| AuthError::Invalid)?,
        None => return Err(AuthError::MissingToken),
    };

    let token = extract_token(header)?;
    verifier.verify(token)
}
