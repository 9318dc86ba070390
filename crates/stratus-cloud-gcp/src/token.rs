//! Service-account JWT bearer grant
//!
//! GCP authentication is a two-step flow: build an RS256-signed JWT
//! assertion from the service-account key, then exchange it for an access
//! token at Google's OAuth2 endpoint with the jwt-bearer grant type.

use crate::error::{GcpError, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use stratus_cloud::ServiceAccountKey;

pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scope covering every API this layer calls
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const ERROR_BODY_LIMIT: usize = 200;

/// Claims of the assertion sent to the token endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub scope: String,
}

/// Build the RS256 assertion for a service-account key.
///
/// Deterministic in `issued_at`, which keeps the claims testable under a
/// frozen clock. The audience is the token endpoint the assertion will be
/// presented to.
pub fn build_assertion(
    key: &ServiceAccountKey,
    audience: &str,
    issued_at: DateTime<Utc>,
) -> Result<String> {
    let iat = issued_at.timestamp();
    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        sub: key.client_email.clone(),
        aud: audience.to_string(),
        iat,
        exp: iat + ASSERTION_LIFETIME_SECS,
        scope: CLOUD_PLATFORM_SCOPE.to_string(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| GcpError::InvalidKey(format!("private_key is not a usable RSA PEM: {e}")))?;

    jsonwebtoken::encode(&header, &claims, &encoding_key)
        .map_err(|e| GcpError::InvalidKey(format!("signing the assertion failed: {e}")))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google OAuth2 token client; one exchange per call, nothing is cached
pub struct GcpTokenClient {
    http: reqwest::Client,
    token_url: String,
}

impl GcpTokenClient {
    pub fn new(http: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            http,
            token_url: token_url.into(),
        }
    }

    pub async fn acquire_token(&self, key: &ServiceAccountKey) -> Result<String> {
        let assertion = build_assertion(key, &self.token_url, Utc::now())?;

        tracing::debug!(client_email = %key.client_email, "exchanging gcp assertion");

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GcpError::AuthenticationFailed(truncate(&body)));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| GcpError::MalformedResponse(format!("token response: {e}")))?;
        Ok(token.access_token)
    }
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_LIMIT {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(ERROR_BODY_LIMIT - 1).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::TimeZone;
    use jsonwebtoken::{DecodingKey, Validation};
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
    use rsa::RsaPrivateKey;

    fn test_keypair() -> (String, String) {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let private_pem = private.to_pkcs8_pem(LineEnding::LF).unwrap().to_string();
        let public_pem = private
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        (private_pem, public_pem)
    }

    fn test_key(private_pem: String) -> ServiceAccountKey {
        ServiceAccountKey {
            client_email: "svc@proj.iam.gserviceaccount.com".to_string(),
            private_key: private_pem,
            project_id: "proj".to_string(),
            private_key_id: Some("key-1".to_string()),
        }
    }

    #[test]
    fn test_assertion_claims_under_frozen_clock() {
        let (private_pem, _) = test_keypair();
        let key = test_key(private_pem);
        let issued_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let assertion = build_assertion(&key, DEFAULT_TOKEN_URL, issued_at).unwrap();

        let payload = assertion.split('.').nth(1).unwrap();
        let decoded: AssertionClaims =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(decoded.aud, "https://oauth2.googleapis.com/token");
        assert_eq!(decoded.exp, decoded.iat + 3600);
        assert_eq!(decoded.iat, issued_at.timestamp());
        assert_eq!(decoded.iss, key.client_email);
        assert_eq!(decoded.scope, CLOUD_PLATFORM_SCOPE);

        let header = jsonwebtoken::decode_header(&assertion).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("key-1"));
    }

    #[test]
    fn test_signature_verifies_against_public_key() {
        let (private_pem, public_pem) = test_keypair();
        let key = test_key(private_pem);
        let issued_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let assertion = build_assertion(&key, DEFAULT_TOKEN_URL, issued_at).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[DEFAULT_TOKEN_URL]);
        validation.validate_exp = false;

        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes()).unwrap();
        let decoded =
            jsonwebtoken::decode::<AssertionClaims>(&assertion, &decoding_key, &validation)
                .unwrap();
        assert_eq!(decoded.claims.sub, "svc@proj.iam.gserviceaccount.com");
    }

    #[test]
    fn test_truncate_bounds_error_bodies() {
        let long = "y".repeat(400);
        let bounded = truncate(&long);
        assert_eq!(bounded.chars().count(), ERROR_BODY_LIMIT);
        assert!(bounded.ends_with('…'));
    }

    #[test]
    fn test_garbage_key_is_rejected_without_network() {
        let key = test_key("not a pem".to_string());
        let err = build_assertion(&key, DEFAULT_TOKEN_URL, Utc::now()).unwrap_err();
        assert!(matches!(err, GcpError::InvalidKey(_)), "{err}");
    }
}
