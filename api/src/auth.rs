use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Bearer-token payload: the user it was issued to and an absolute expiry.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
}

/// Issues and verifies the HS256 bearer tokens returned by register/login.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: i64,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let claims = Claims {
            sub: user_id,
            exp: (Utc::now() + Duration::minutes(self.ttl_minutes)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized {
                message: "Invalid or expired token".to_string(),
                docs_hint: Some(
                    "Obtain a fresh token via POST /api/v1/auth/login.".to_string(),
                ),
            })
    }
}

/// Authenticated user extracted from the `Authorization: Bearer <token>`
/// header. Rejects missing, malformed, or expired tokens with 401 before the
/// handler body runs.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
                docs_hint: Some(
                    "Include 'Authorization: Bearer <token>' header. \
                     Tokens are issued by POST /api/v1/auth/register and /login."
                        .to_string(),
                ),
            })?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized {
                message: "Authorization header must use Bearer scheme".to_string(),
                docs_hint: Some("Format: 'Authorization: Bearer <token>'".to_string()),
            })?;

        let claims = state.tokens.verify(token)?;
        Ok(AuthenticatedUser {
            user_id: claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_roundtrips_the_user_id() {
        let signer = TokenSigner::new("test-secret", 30);
        let user_id = Uuid::now_v7();
        let token = signer.issue(user_id).unwrap();
        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Issue a token that expired two hours ago, well past validation leeway.
        let signer = TokenSigner::new("test-secret", -120);
        let token = signer.issue(Uuid::now_v7()).unwrap();
        assert!(matches!(
            signer.verify(&token),
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let signer = TokenSigner::new("test-secret", 30);
        let other = TokenSigner::new("other-secret", 30);
        let token = other.issue(Uuid::now_v7()).unwrap();
        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let signer = TokenSigner::new("test-secret", 30);
        assert!(signer.verify("not-a-jwt").is_err());
    }
}
