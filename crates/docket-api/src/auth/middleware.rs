use crate::auth::api_key::hash_api_key;
use crate::auth::models::TenantContext;
use crate::constants::API_KEY_HEADER;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use docket_core::constants::{DEFAULT_TENANT_ID, DEFAULT_USER_ID};
use docket_core::AppError;
use docket_db::ApiKeyRepository;
use std::sync::Arc;
use subtle::ConstantTimeEq;

#[derive(Clone)]
pub struct AuthState {
    pub master_api_key: String,
    pub api_key_repository: ApiKeyRepository,
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Raw key from `Authorization: Bearer <key>`, falling back to `x-api-key`.
fn extract_token(headers: &HeaderMap) -> Result<&str, AppError> {
    if let Some(header) = headers.get("Authorization") {
        let value = header.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })?;
        return value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("Invalid authorization header format".to_string())
            });
    }

    headers
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing API key".to_string()))
}

async fn resolve_tenant(
    token: &str,
    auth_state: &AuthState,
) -> Result<TenantContext, AppError> {
    if secure_compare(token, &auth_state.master_api_key) {
        return Ok(TenantContext {
            tenant_id: DEFAULT_TENANT_ID,
            user_id: DEFAULT_USER_ID,
        });
    }

    let api_key = auth_state
        .api_key_repository
        .get_by_key_hash(&hash_api_key(token))
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid API key".to_string()))?;

    let api_key_repo = auth_state.api_key_repository.clone();
    let api_key_id = api_key.id;
    tokio::spawn(async move {
        if let Err(e) = api_key_repo.update_last_used(api_key_id).await {
            tracing::warn!(error = %e, api_key_id = %api_key_id, "Failed to record API key use");
        }
    });

    Ok(TenantContext {
        tenant_id: api_key.tenant_id,
        // Keys not bound to a user act as their own subject.
        user_id: api_key.user_id.unwrap_or(api_key.id),
    })
}

pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Rejected unauthenticated request");
            return HttpAppError(e).into_response();
        }
    };

    match resolve_tenant(&token, &auth_state).await {
        Ok(tenant_context) => {
            tracing::debug!(
                tenant_id = %tenant_context.tenant_id,
                user_id = %tenant_context.user_id,
                "Request authenticated"
            );
            request.extensions_mut().insert(tenant_context);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
