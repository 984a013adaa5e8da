//! Per-request session context.
//!
//! Authentication lives in front of this service; requests arrive with the
//! resolved user in the `x-user-id` header. Development deployments may configure
//! a fallback user for requests without one.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::records::UserId;

pub const USER_HEADER: &str = "x-user-id";

/// Request-independent session settings, installed as an axum `Extension`.
#[derive(Debug, Clone, Default)]
pub struct SessionPolicy {
    dev_user: Option<UserId>,
}

impl SessionPolicy {
    pub fn new(dev_user: Option<UserId>) -> Self {
        Self { dev_user }
    }

    pub fn dev_user(&self) -> Option<&UserId> {
        self.dev_user.as_ref()
    }
}

/// The user the current request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(USER_HEADER) {
            let raw = value
                .to_str()
                .map_err(|_| SessionRejection::MalformedHeader)?
                .trim();
            if raw.is_empty() {
                return Err(SessionRejection::MalformedHeader);
            }
            return Ok(Self(UserId(raw.to_string())));
        }

        parts
            .extensions
            .get::<SessionPolicy>()
            .and_then(SessionPolicy::dev_user)
            .cloned()
            .map(Self)
            .ok_or(SessionRejection::Missing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionRejection {
    #[error("no authenticated user on request")]
    Missing,
    #[error("x-user-id header must be a non-empty visible string")]
    MalformedHeader,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        let status = match self {
            SessionRejection::Missing => StatusCode::UNAUTHORIZED,
            SessionRejection::MalformedHeader => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<SessionUser, SessionRejection> {
        let (mut parts, _) = request.into_parts();
        SessionUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn header_takes_precedence_over_dev_user() {
        let mut request = Request::builder()
            .header(USER_HEADER, " agent-42 ")
            .body(())
            .expect("request builds");
        request
            .extensions_mut()
            .insert(SessionPolicy::new(Some(UserId::from("dev"))));

        let user = extract(request).await.expect("user resolved");
        assert_eq!(user, SessionUser(UserId::from("agent-42")));
    }

    #[tokio::test]
    async fn falls_back_to_dev_user() {
        let mut request = Request::builder().body(()).expect("request builds");
        request
            .extensions_mut()
            .insert(SessionPolicy::new(Some(UserId::from("dev"))));

        let user = extract(request).await.expect("dev user resolved");
        assert_eq!(user.0, UserId::from("dev"));
    }

    #[tokio::test]
    async fn rejects_missing_and_blank_users() {
        let request = Request::builder().body(()).expect("request builds");
        assert_eq!(extract(request).await, Err(SessionRejection::Missing));

        let request = Request::builder()
            .header(USER_HEADER, "   ")
            .body(())
            .expect("request builds");
        assert_eq!(extract(request).await, Err(SessionRejection::MalformedHeader));
        assert_eq!(
            SessionRejection::Missing.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
