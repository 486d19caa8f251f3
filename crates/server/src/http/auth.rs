use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::models::member::Member;
use services::services::member::MemberService;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const MEMBER_ID_HEADER: &str = "x-member-id";

/// The member resolved from the request's identity header.
#[derive(Debug, Clone)]
pub struct CurrentMember(pub Member);

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn extract_presented_identity(headers: &HeaderMap) -> Option<&str> {
    // 1) Authorization: Bearer <member id>
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
    {
        return Some(value);
    }

    // 2) X-Member-Id: <member id>
    headers
        .get(MEMBER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn unauthorized(req: &Request, reason: &'static str) -> Response {
    tracing::warn!(
        path = %req.uri().path(),
        method = %req.method(),
        reason,
        "Unauthorized API request"
    );
    ApiError::Unauthorized.into_response()
}

/// Resolves the presented member id, if any, into a [`CurrentMember`] extension.
///
/// Requests without an identity pass through untouched; handlers that need one
/// reject them when extracting [`CurrentMember`]. A malformed or unknown id is
/// rejected here so stale clients learn to drop it.
pub async fn resolve_member(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(presented) = extract_presented_identity(req.headers()) else {
        return next.run(req).await;
    };
    let Ok(member_id) = Uuid::parse_str(presented) else {
        return unauthorized(&req, "malformed_member_id");
    };

    match MemberService::find_member(state.db(), member_id).await {
        Ok(member) => {
            req.extensions_mut().insert(CurrentMember(member));
            next.run(req).await
        }
        Err(services::services::error::ServiceError::UnknownMember) => {
            unauthorized(&req, "unknown_member")
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentMember {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentMember>()
            .cloned()
            .ok_or(ApiError::Unauthorized)
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for CurrentMember {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<CurrentMember>().cloned())
    }
}
