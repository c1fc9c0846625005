use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Verified token payload, kept exactly as decoded (claim name -> claim value).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// `sub` claim, when it is a string.
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}

/// Process-wide signing secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Capability that turns a candidate token into verified claims.
///
/// The guard owns the secret and hands it over on every call, so a verifier
/// never needs process-global state.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str, secret: &SigningSecret) -> Result<Claims, VerifyError>;
}

/// Knobs for [`JwtVerifier`]. Kept apart from `Config` so the verifier stays testable.
#[derive(Debug, Clone)]
pub struct VerifierPolicy {
    pub algorithm: Algorithm,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
}

impl Default for VerifierPolicy {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::HS256,
            issuer: None,
            audience: None,
            leeway_seconds: 60,
        }
    }
}

/// HMAC JWT verifier backed by `jsonwebtoken`.
///
/// `jsonwebtoken::Validation` checks:
/// - signature and algorithm
/// - `exp` / `nbf` when the token carries them (none of them is required)
/// - `iss` / `aud` only when the policy configures them
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(policy: &VerifierPolicy) -> Self {
        let mut validation = Validation::new(policy.algorithm);
        validation.required_spec_claims.clear();
        validation.validate_nbf = true;
        validation.leeway = policy.leeway_seconds;

        if let Some(issuer) = policy.issuer.as_deref() {
            validation.set_issuer(&[issuer]);
        }
        match policy.audience.as_deref() {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self { validation }
    }
}

impl TokenVerifier for JwtVerifier {
    fn verify(&self, token: &str, secret: &SigningSecret) -> Result<Claims, VerifyError> {
        let key = DecodingKey::from_secret(secret.as_bytes());
        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &key, &self.validation)?;
        Ok(Claims::new(data.claims))
    }
}
