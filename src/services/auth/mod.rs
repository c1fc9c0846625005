pub mod extract;
pub mod factory;
pub mod guard;
pub mod verifier;

pub use factory::build_auth_guard;
pub use guard::{AuthDenied, WsAuthGuard};
pub use verifier::{Claims, JwtVerifier, SigningSecret, VerifierPolicy};
