use std::path::Path;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::SigningKey;
use jwt_simple::prelude::*;
use rand::rngs::OsRng;

use super::AccessClaims;
use crate::error::{AppError, Result};

const ISSUER: &str = "streampass";

/// Signs access tokens with the service's Ed25519 key.
#[derive(Clone)]
pub struct TokenSigner {
    key_pair: Arc<Ed25519KeyPair>,
}

impl TokenSigner {
    /// Build a signer from a raw 32-byte Ed25519 seed.
    pub fn from_seed(seed: [u8; 32]) -> Result<Self> {
        let signing_key = SigningKey::from_bytes(&seed);
        let key_pair = Ed25519KeyPair::from_bytes(&signing_key.to_keypair_bytes())
            .map_err(|e| AppError::Internal(format!("Failed to create key pair: {}", e)))?;
        Ok(Self {
            key_pair: Arc::new(key_pair),
        })
    }

    /// Load the signing key from `path`, generating and persisting a fresh
    /// one on first run.
    pub fn load_or_generate(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            let encoded = std::fs::read_to_string(path)
                .map_err(|e| AppError::Internal(format!("Failed to read signing key: {}", e)))?;
            let decoded = BASE64
                .decode(encoded.trim())
                .map_err(|e| AppError::Internal(format!("Invalid signing key encoding: {}", e)))?;
            let seed: [u8; 32] = decoded
                .try_into()
                .map_err(|_| AppError::Internal("Signing key must be 32 bytes".into()))?;
            Self::from_seed(seed)
        } else {
            let signing_key = SigningKey::generate(&mut OsRng);
            let seed = signing_key.to_bytes();
            std::fs::write(path, BASE64.encode(seed))
                .map_err(|e| AppError::Internal(format!("Failed to write signing key: {}", e)))?;
            tracing::info!("Generated new token signing key at {}", path);
            Self::from_seed(seed)
        }
    }

    /// Base64 public key, for external verifiers.
    pub fn public_key_b64(&self) -> String {
        BASE64.encode(self.key_pair.public_key().to_bytes())
    }

    /// Sign an access token bound to an installation identifier, valid for
    /// the granted number of days.
    pub fn sign_access_token(
        &self,
        installation_id: &str,
        claims: &AccessClaims,
        valid_days: i64,
    ) -> Result<String> {
        let jwt_claims = Claims::with_custom_claims(
            claims.clone(),
            Duration::from_days(valid_days.max(0) as u64),
        )
        .with_issuer(ISSUER)
        .with_subject(installation_id);

        self.key_pair
            .sign(jwt_claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token and return its claims. Used by the authentication
    /// collaborator and by tests.
    pub fn verify_access_token(&self, token: &str) -> Result<JWTClaims<AccessClaims>> {
        let options = VerificationOptions {
            allowed_issuers: Some([ISSUER.to_string()].into_iter().collect()),
            ..Default::default()
        };
        self.key_pair
            .public_key()
            .verify_token::<AccessClaims>(token, Some(options))
            .map_err(|e| AppError::BadRequest(format!("Invalid token: {}", e)))
    }
}
