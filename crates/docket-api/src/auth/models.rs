use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use uuid::Uuid;

/// Tenant and subject resolved from the request's API key and stored in
/// request extensions by the auth middleware.
///
/// Handlers take it as an explicit argument; every tenant-facing query is
/// scoped by `tenant_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
}

// Extracted from parts (not `Extension`) so it can precede `Multipart`.
impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(
                        ErrorResponse::new("Missing tenant context", "MISSING_TENANT_CONTEXT")
                            .with_suggested_action("Check the API key"),
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn extracts_context_from_extensions() {
        let ctx = TenantContext {
            tenant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        };
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(ctx);

        let extracted = TenantContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted, ctx);
    }

    #[tokio::test]
    async fn missing_context_is_unauthorized() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let (status, Json(body)) = TenantContext::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.code, "MISSING_TENANT_CONTEXT");
    }
}
