use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

/// How long an emailed verification link stays usable.
pub const VERIFICATION_TTL: Duration = Duration::minutes(30);

/// Upper bound (exclusive) of the random nonce embedded in each token.
const NONCE_BOUND: u64 = 10_000_000_000;

/// Payload of an email verification token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationClaims {
    pub user_id: Uuid,
    pub token: u64, // random nonce, makes every issue distinct
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// HS256 keys derived from the server's auth secret.
#[derive(Clone)]
pub struct VerificationKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl VerificationKeys {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn mint(&self, user_id: Uuid) -> anyhow::Result<IssuedToken> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now + VERIFICATION_TTL;
        let claims = VerificationClaims {
            user_id,
            token: rand::thread_rng().gen_range(0..NONCE_BOUND),
            iat: now.unix_timestamp() as usize,
            exp: expires_at.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "verification token signed");
        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> anyhow::Result<VerificationClaims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        let data = decode::<VerificationClaims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.user_id, "verification token verified");
        Ok(data.claims)
    }
}
