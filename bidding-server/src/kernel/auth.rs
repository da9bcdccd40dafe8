#[cfg(test)]
use mockall::automock;
use {
    super::entities::{
        DealerId,
        Role,
    },
    crate::api::RestError,
    axum::async_trait,
    base64::{
        engine::general_purpose::URL_SAFE_NO_PAD,
        Engine as _,
    },
    hmac::{
        Hmac,
        Mac,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    sha2::Sha256,
    time::OffsetDateTime,
};

/// Claims carried by a verified token. Token issuance lives in the external
/// identity service; this server only checks the signature and expiry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub")]
    pub subject:    DealerId,
    pub role:       Role,
    /// Unix timestamp in seconds after which the token is no longer valid.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl Claims {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= OffsetDateTime::now_utc().unix_timestamp()
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    async fn verify(&self, token: &str) -> Result<Claims, RestError>;
}

type HmacSha256 = Hmac<Sha256>;

/// Verifies `base64url(claims).base64url(hmac-sha256(claims))` tokens signed
/// with the secret shared with the identity service.
pub struct HmacTokenVerifier {
    secret: Vec<u8>,
}

impl HmacTokenVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for HmacTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, RestError> {
        let (payload, signature) = token.split_once('.').ok_or(RestError::Unauthorized)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| RestError::Unauthorized)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("Hmac accepts any key length");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| RestError::Unauthorized)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| RestError::Unauthorized)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| RestError::Unauthorized)?;
        if claims.is_expired() {
            return Err(RestError::Unauthorized);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn sign(claims: &Claims, secret: &str) -> String {
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims serialize"));
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("any key length");
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{}.{}", payload, signature)
    }

    fn dealer_claims() -> Claims {
        Claims {
            subject:    42,
            role:       Role::Dealer,
            expires_at: OffsetDateTime::now_utc().unix_timestamp() + 3600,
        }
    }

    #[tokio::test]
    async fn test_verify_valid_token() {
        let verifier = HmacTokenVerifier::new(SECRET);
        let claims = verifier
            .verify(&sign(&dealer_claims(), SECRET))
            .await
            .expect("token should verify");
        assert_eq!(claims.subject, 42);
        assert_eq!(claims.role, Role::Dealer);
    }

    #[tokio::test]
    async fn test_verify_rejects_wrong_secret() {
        let verifier = HmacTokenVerifier::new(SECRET);
        let token = sign(&dealer_claims(), "another-secret");
        assert!(matches!(
            verifier.verify(&token).await,
            Err(RestError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_tampered_payload() {
        let verifier = HmacTokenVerifier::new(SECRET);
        let token = sign(&dealer_claims(), SECRET);
        let mut admin_claims = dealer_claims();
        admin_claims.role = Role::Admin;
        let forged_payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&admin_claims).expect("claims serialize"));
        let signature = token.split_once('.').expect("token has signature").1;
        let forged = format!("{}.{}", forged_payload, signature);
        assert!(matches!(
            verifier.verify(&forged).await,
            Err(RestError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_expired_token() {
        let verifier = HmacTokenVerifier::new(SECRET);
        let mut claims = dealer_claims();
        claims.expires_at = OffsetDateTime::now_utc().unix_timestamp() - 1;
        assert!(matches!(
            verifier.verify(&sign(&claims, SECRET)).await,
            Err(RestError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_verify_rejects_garbage() {
        let verifier = HmacTokenVerifier::new(SECRET);
        assert!(matches!(
            verifier.verify("not-a-token").await,
            Err(RestError::Unauthorized)
        ));
    }
}
