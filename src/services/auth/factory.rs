/// Factory: build `WsAuthGuard` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{JwtVerifier, SigningSecret, VerifierPolicy, WsAuthGuard};

pub fn build_auth_guard(config: &Config) -> Arc<WsAuthGuard> {
    let policy = VerifierPolicy {
        algorithm: config.jwt_algorithm,
        issuer: config.auth_issuer.clone(),
        audience: config.auth_audience.clone(),
        leeway_seconds: config.access_token_leeway_seconds,
    };

    let verifier = Arc::new(JwtVerifier::new(&policy));
    let secret = SigningSecret::new(config.jwt_secret.as_bytes());

    Arc::new(WsAuthGuard::new(verifier, secret))
}
