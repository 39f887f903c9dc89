use crate::extractors::RejectionType;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use domain::Id;
use log::*;

/// Set by the gateway in front of this service once it has authenticated the
/// caller. Requests that reach us without it are anonymous.
pub const AUTHENTICATED_USER_HEADER: &str = "x-authenticated-user-id";

/// The recipient making the request.
pub(crate) struct AuthenticatedUser(pub Id);

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(AUTHENTICATED_USER_HEADER) else {
            return Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string()));
        };

        value
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<Id>().ok())
            .map(AuthenticatedUser)
            .ok_or_else(|| {
                warn!("Rejecting malformed {AUTHENTICATED_USER_HEADER} header: {value:?}");
                (
                    StatusCode::BAD_REQUEST,
                    format!("{AUTHENTICATED_USER_HEADER} must be a user id"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<Id, StatusCode> {
        let mut builder = Request::builder().uri("/notifications");
        if let Some(value) = header {
            builder = builder.header(AUTHENTICATED_USER_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();

        AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .map(|AuthenticatedUser(id)| id)
            .map_err(|(status, _)| status)
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        assert_eq!(extract(None).await, Err(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn malformed_header_is_a_bad_request() {
        assert_eq!(extract(Some("ava")).await, Err(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn user_id_is_extracted() {
        let id = Id::new_v4();

        assert_eq!(extract(Some(&id.to_string())).await, Ok(id));
    }
}
