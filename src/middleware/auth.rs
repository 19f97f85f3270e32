use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{Json, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use uuid::Uuid;

use crate::access::Role;
use crate::auth::Claims;
use crate::config;
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { id: claims.sub, role: claims.role }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<serde_json::Value>)> {
    // Extract JWT from Authorization header
    let token = extract_jwt_from_headers(&headers).map_err(unauthorized)?;

    // Validate and decode JWT
    let claims = validate_jwt(&token).map_err(unauthorized)?;

    // Convert claims to AuthUser and inject into request
    let auth_user = AuthUser::from(claims);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

fn unauthorized(msg: String) -> (StatusCode, Json<serde_json::Value>) {
    let api_error = ApiError::unauthorized(msg);
    (
        StatusCode::from_u16(api_error.status_code()).unwrap_or(StatusCode::UNAUTHORIZED),
        Json(api_error.to_json()),
    )
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

/// Validate JWT token and extract claims. Tokens carrying an unknown role
/// fail here, so unrecognized roles are rejected before any handler runs.
fn validate_jwt(token: &str) -> Result<Claims, String> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err("JWT secret not configured".to_string());
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| format!("Invalid JWT token: {}", e))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_header() {
        let headers = HeaderMap::new();
        assert!(extract_jwt_from_headers(&headers).is_err());
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Basic dXNlcjpwYXNz".parse().unwrap());
        assert!(extract_jwt_from_headers(&headers).is_err());
    }

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }
}
