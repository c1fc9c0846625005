//! Handshake guard for the real-time channel.
//!
//! Extracts a candidate token (cookie first, then `Authorization: Bearer`),
//! verifies it with the injected [`TokenVerifier`], and writes the claims into
//! the connection's [`SessionContext`] under `user`.
//!
//! Callers only ever see two denial reasons. Every verifier failure collapses
//! into `InvalidToken`; the underlying error is logged and dropped.

use std::sync::Arc;

use axum::http::HeaderMap;
use thiserror::Error;

use super::extract::Handshake;
use super::verifier::{SigningSecret, TokenVerifier};
use crate::services::realtime::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthDenied {
    #[error("token not found")]
    TokenNotFound,
    #[error("invalid token")]
    InvalidToken,
}

#[derive(Clone)]
pub struct WsAuthGuard {
    verifier: Arc<dyn TokenVerifier>,
    secret: SigningSecret,
}

impl std::fmt::Debug for WsAuthGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthGuard")
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

impl WsAuthGuard {
    pub fn new(verifier: Arc<dyn TokenVerifier>, secret: SigningSecret) -> Self {
        Self { verifier, secret }
    }

    /// Decide whether the handshake may proceed.
    ///
    /// On success the context gains a `user` entry; on failure it is left untouched.
    pub fn authenticate(
        &self,
        handshake: &Handshake,
        context: &mut SessionContext,
    ) -> Result<(), AuthDenied> {
        let Some(token) = handshake.candidate_token() else {
            tracing::warn!("handshake rejected: no token in cookie or authorization header");
            return Err(AuthDenied::TokenNotFound);
        };

        let claims = match self.verifier.verify(token, &self.secret) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::warn!(error = ?err, "handshake rejected: token verification failed");
                return Err(AuthDenied::InvalidToken);
            }
        };

        context.set_user(claims);
        Ok(())
    }

    /// Same as [`Self::authenticate`], starting from raw request headers.
    pub fn authenticate_headers(
        &self,
        headers: &HeaderMap,
        context: &mut SessionContext,
    ) -> Result<(), AuthDenied> {
        self.authenticate(&Handshake::from_headers(headers), context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::verifier::{Claims, JwtVerifier, VerifierPolicy, VerifyError};
    use crate::services::realtime::session::USER_KEY;
    use axum::http::{HeaderValue, header};
    use jsonwebtoken::errors::ErrorKind;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// Accepts exactly one token and records what it was asked to verify.
    struct FakeVerifier {
        accepted: &'static str,
        claims: Value,
        seen: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl FakeVerifier {
        fn new(accepted: &'static str, claims: Value) -> Arc<Self> {
            Arc::new(Self {
                accepted,
                claims,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn seen_tokens(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .map(|(t, _)| t.clone())
                .collect()
        }
    }

    impl TokenVerifier for FakeVerifier {
        fn verify(&self, token: &str, secret: &SigningSecret) -> Result<Claims, VerifyError> {
            self.seen
                .lock()
                .unwrap()
                .push((token.to_string(), secret.as_bytes().to_vec()));
            if token != self.accepted {
                return Err(VerifyError::Jwt(ErrorKind::InvalidSignature.into()));
            }
            match &self.claims {
                Value::Object(map) => Ok(Claims::new(map.clone())),
                _ => Err(VerifyError::Jwt(ErrorKind::InvalidToken.into())),
            }
        }
    }

    fn guard(verifier: Arc<FakeVerifier>) -> WsAuthGuard {
        WsAuthGuard::new(verifier, SigningSecret::new("process-secret"))
    }

    #[test]
    fn valid_token_attaches_exact_claims() {
        let verifier = FakeVerifier::new("good", json!({"sub": "u1"}));
        let guard = guard(verifier.clone());
        let mut ctx = SessionContext::new();

        let result = guard.authenticate(&Handshake::new(Some("token=good"), None), &mut ctx);

        assert_eq!(result, Ok(()));
        assert_eq!(ctx.get(USER_KEY), Some(&json!({"sub": "u1"})));
    }

    #[test]
    fn verifier_receives_process_secret() {
        let verifier = FakeVerifier::new("good", json!({"sub": "u1"}));
        let guard = guard(verifier.clone());

        guard
            .authenticate(
                &Handshake::new(None, Some("Bearer good")),
                &mut SessionContext::new(),
            )
            .unwrap();

        let seen = verifier.seen.lock().unwrap();
        assert_eq!(seen[0].1, b"process-secret".to_vec());
    }

    #[test]
    fn failed_verification_is_invalid_token_and_leaves_context_empty() {
        let verifier = FakeVerifier::new("good", json!({"sub": "u1"}));
        let guard = guard(verifier);
        let mut ctx = SessionContext::new();

        let result = guard.authenticate(&Handshake::new(Some("token=forged"), None), &mut ctx);

        assert_eq!(result, Err(AuthDenied::InvalidToken));
        assert_eq!(result.unwrap_err().to_string(), "invalid token");
        assert!(ctx.get(USER_KEY).is_none());
    }

    #[test]
    fn missing_token_is_token_not_found() {
        let verifier = FakeVerifier::new("good", json!({"sub": "u1"}));
        let guard = guard(verifier.clone());

        for handshake in [
            Handshake::default(),
            Handshake::new(None, Some("Basic xyz789")),
            Handshake::new(Some("foo=bar; theme=dark"), None),
            Handshake::new(Some("foo=bar"), Some("Basic xyz789")),
        ] {
            let mut ctx = SessionContext::new();
            let result = guard.authenticate(&handshake, &mut ctx);
            assert_eq!(result, Err(AuthDenied::TokenNotFound));
            assert_eq!(result.unwrap_err().to_string(), "token not found");
            assert!(ctx.get(USER_KEY).is_none());
        }

        // The verifier is never consulted without a candidate.
        assert!(verifier.seen_tokens().is_empty());
    }

    #[test]
    fn cookie_token_takes_precedence_over_bearer() {
        let verifier = FakeVerifier::new("header-token", json!({"sub": "u2"}));
        let guard = guard(verifier.clone());
        let mut ctx = SessionContext::new();

        let result = guard.authenticate(
            &Handshake::new(Some("token=cookie-token"), Some("Bearer header-token")),
            &mut ctx,
        );

        // Only the cookie token is tried, even though the header one would verify.
        assert_eq!(result, Err(AuthDenied::InvalidToken));
        assert_eq!(verifier.seen_tokens(), vec!["cookie-token".to_string()]);
    }

    #[test]
    fn mangled_token_bytes_are_invalid_token() {
        let verifier = FakeVerifier::new("good", json!({"sub": "u1"}));
        let guard = guard(verifier.clone());
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_bytes(b"token=\xffgood").unwrap(),
        );
        let mut ctx = SessionContext::new();

        let result = guard.authenticate_headers(&headers, &mut ctx);

        assert_eq!(result, Err(AuthDenied::InvalidToken));
        assert!(ctx.get(USER_KEY).is_none());
        assert_eq!(verifier.seen_tokens(), vec!["\u{fffd}good".to_string()]);
    }

    const JWT_SECRET: &str = "handshake-secret";

    fn jwt_guard() -> WsAuthGuard {
        WsAuthGuard::new(
            Arc::new(JwtVerifier::new(&VerifierPolicy::default())),
            SigningSecret::new(JWT_SECRET),
        )
    }

    fn signed(claims: Value) -> String {
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn utf8_cookie_next_to_a_valid_token_is_allowed() {
        let token = signed(json!({"sub": "u1"}));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_bytes(format!("display=José; token={token}").as_bytes()).unwrap(),
        );
        let mut ctx = SessionContext::new();

        let result = jwt_guard().authenticate_headers(&headers, &mut ctx);

        assert_eq!(result, Ok(()));
        assert_eq!(ctx.get(USER_KEY), Some(&json!({"sub": "u1"})));
    }

    #[test]
    fn valid_cookie_token_ignores_odd_authorization_bytes() {
        let token = signed(json!({"sub": "u1"}));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("token={token}")).unwrap(),
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes("Bearer café".as_bytes()).unwrap(),
        );
        let mut ctx = SessionContext::new();

        let result = jwt_guard().authenticate_headers(&headers, &mut ctx);

        assert_eq!(result, Ok(()));
        assert_eq!(ctx.get(USER_KEY), Some(&json!({"sub": "u1"})));
    }

    #[test]
    fn headers_entry_point_allows_bearer() {
        let verifier = FakeVerifier::new("good", json!({"sub": "u1", "name": "Mika"}));
        let guard = guard(verifier);
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer good"));
        let mut ctx = SessionContext::new();

        guard.authenticate_headers(&headers, &mut ctx).unwrap();

        assert_eq!(ctx.user().unwrap().get("name"), Some(&json!("Mika")));
    }
}
