use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::time::Duration;
use uuid::Uuid;

use super::model::{AuthenticatedUser, Claims};
use super::{AuthError, Authenticator};

/// Validates HS256 access tokens signed with the shared secret
pub struct JwtValidator {
    decoding_key: DecodingKey,
    issuer: String,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(secret: &str, issuer: String, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            leeway: leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_aud = false;
        validation.leeway = self.leeway;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let user_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| AuthError::InvalidToken("Subject is not a user id".to_string()))?;

        Ok(AuthenticatedUser { user_id })
    }
}

#[async_trait]
impl Authenticator for JwtValidator {
    async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        self.validate_token(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use tokio_test::assert_err;

    const SECRET: &str = "test-secret";

    fn now() -> u64 {
        chrono::Utc::now().timestamp() as u64
    }

    fn token(sub: &str, iss: &str, exp: u64, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            iss: iss.to_string(),
            iat: now(),
            exp,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn validator() -> JwtValidator {
        JwtValidator::new(SECRET, "tubely-access".to_string(), Duration::from_secs(0))
    }

    #[tokio::test]
    async fn test_valid_token_yields_user() {
        let user_id = Uuid::new_v4();
        let jwt = token(&user_id.to_string(), "tubely-access", now() + 3600, SECRET);

        let user = validator().authenticate(&jwt).await.unwrap();
        assert_eq!(user.user_id, user_id);
    }

    #[test]
    fn test_rejects_wrong_secret_issuer_and_expiry() {
        let sub = Uuid::new_v4().to_string();
        let v = validator();

        let wrong_secret = token(&sub, "tubely-access", now() + 3600, "other-secret");
        assert!(matches!(
            v.validate_token(&wrong_secret),
            Err(AuthError::InvalidToken(_))
        ));

        let wrong_issuer = token(&sub, "someone-else", now() + 3600, SECRET);
        assert_err!(v.validate_token(&wrong_issuer));

        let expired = token(&sub, "tubely-access", now() - 3600, SECRET);
        assert_err!(v.validate_token(&expired));
    }

    #[test]
    fn test_rejects_non_uuid_subject() {
        let jwt = token("not-a-uuid", "tubely-access", now() + 3600, SECRET);
        assert_err!(validator().validate_token(&jwt));
        assert_err!(validator().validate_token("garbage"));
    }
}
