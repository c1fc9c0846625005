//! Candidate-token extraction from a WebSocket handshake.
//!
//! Order (first match wins):
//! 1. `cookie` header, `token=<value>` pair
//! 2. `authorization` header, `Bearer <value>`
//!
//! Nothing here verifies anything; it only decides which string the verifier gets.

use axum::http::{HeaderMap, HeaderValue, header};

const TOKEN_COOKIE_KEY: &str = "token=";
const BEARER_PREFIX: &str = "Bearer ";

/// Header fields of an inbound handshake that the guard looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Handshake {
    pub cookie: Option<String>,
    pub authorization: Option<String>,
}

impl Handshake {
    #[cfg(test)]
    pub fn new(cookie: Option<&str>, authorization: Option<&str>) -> Self {
        Self {
            cookie: cookie.map(str::to_owned),
            authorization: authorization.map(str::to_owned),
        }
    }

    /// Read `cookie` / `authorization` from request headers.
    ///
    /// Multiple `cookie` fields (HTTP/2 splits them) are joined with `"; "`.
    /// Bytes outside visible ASCII (UTF-8 cookie values, obs-text) are decoded
    /// lossily, so an unrelated odd cookie never hides a usable token. A token
    /// that itself carries such bytes reaches the verifier mangled and fails there.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let cookies: Vec<String> = headers.get_all(header::COOKIE).iter().map(lossy).collect();
        let cookie = (!cookies.is_empty()).then(|| cookies.join("; "));

        let authorization = headers.get(header::AUTHORIZATION).map(lossy);

        Self {
            cookie,
            authorization,
        }
    }

    pub fn candidate_token(&self) -> Option<&str> {
        self.cookie
            .as_deref()
            .and_then(token_from_cookie)
            .or_else(|| self.authorization.as_deref().and_then(token_from_bearer))
    }
}

fn lossy(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

/// Substring scan for `token=` up to the next `;` or end of input.
///
/// An occurrence with an empty value does not match; scanning resumes after it.
fn token_from_cookie(cookie: &str) -> Option<&str> {
    let mut rest = cookie;
    while let Some(pos) = rest.find(TOKEN_COOKIE_KEY) {
        let after = &rest[pos + TOKEN_COOKIE_KEY.len()..];
        let value = after.split(';').next().unwrap_or_default();
        if !value.is_empty() {
            return Some(value);
        }
        rest = after;
    }
    None
}

// Case-sensitive, single trailing space.
fn token_from_bearer(authorization: &str) -> Option<&str> {
    authorization
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn cookie_token_between_other_pairs() {
        let hs = Handshake::new(Some("foo=bar; token=abc123; other=1"), None);
        assert_eq!(hs.candidate_token(), Some("abc123"));
    }

    #[test]
    fn cookie_token_at_end_of_string() {
        let hs = Handshake::new(Some("token=abc123"), None);
        assert_eq!(hs.candidate_token(), Some("abc123"));
    }

    #[test]
    fn bearer_header_without_cookie() {
        let hs = Handshake::new(None, Some("Bearer xyz789"));
        assert_eq!(hs.candidate_token(), Some("xyz789"));
    }

    #[test]
    fn basic_scheme_is_not_a_candidate() {
        let hs = Handshake::new(None, Some("Basic xyz789"));
        assert_eq!(hs.candidate_token(), None);
    }

    #[test]
    fn bearer_prefix_is_case_sensitive() {
        assert_eq!(Handshake::new(None, Some("bearer xyz")).candidate_token(), None);
        assert_eq!(Handshake::new(None, Some("Bearer  xyz")).candidate_token(), Some(" xyz"));
        assert_eq!(Handshake::new(None, Some("Bearer ")).candidate_token(), None);
    }

    #[test]
    fn cookie_without_token_falls_back_to_bearer() {
        let hs = Handshake::new(Some("foo=bar; theme=dark"), Some("Bearer xyz789"));
        assert_eq!(hs.candidate_token(), Some("xyz789"));

        let hs = Handshake::new(Some("foo=bar; theme=dark"), None);
        assert_eq!(hs.candidate_token(), None);
    }

    #[test]
    fn cookie_wins_over_authorization() {
        let hs = Handshake::new(Some("token=from-cookie"), Some("Bearer from-header"));
        assert_eq!(hs.candidate_token(), Some("from-cookie"));
    }

    #[test]
    fn empty_cookie_value_keeps_scanning() {
        let hs = Handshake::new(Some("token=; token=second"), None);
        assert_eq!(hs.candidate_token(), Some("second"));

        let hs = Handshake::new(Some("token="), Some("Bearer xyz"));
        assert_eq!(hs.candidate_token(), Some("xyz"));
    }

    #[test]
    fn scan_is_substring_based() {
        // `access_token=` contains `token=`; the scan does not look at cookie names.
        let hs = Handshake::new(Some("access_token=abc"), None);
        assert_eq!(hs.candidate_token(), Some("abc"));
    }

    #[test]
    fn from_headers_reads_both_fields() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("token=t1"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t2"));

        let hs = Handshake::from_headers(&headers);
        assert_eq!(hs.cookie.as_deref(), Some("a=1; token=t1"));
        assert_eq!(hs.authorization.as_deref(), Some("Bearer t2"));
        assert_eq!(hs.candidate_token(), Some("t1"));
    }

    #[test]
    fn from_headers_without_credentials() {
        let hs = Handshake::from_headers(&HeaderMap::new());
        assert_eq!(hs, Handshake::default());
        assert_eq!(hs.candidate_token(), None);
    }

    #[test]
    fn utf8_cookie_value_does_not_hide_the_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_bytes("display=José; token=t1".as_bytes()).unwrap(),
        );

        let hs = Handshake::from_headers(&headers);
        assert_eq!(hs.candidate_token(), Some("t1"));
    }

    #[test]
    fn unused_authorization_with_odd_bytes_is_harmless() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token=t1"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer caf\xe9").unwrap(),
        );

        assert_eq!(Handshake::from_headers(&headers).candidate_token(), Some("t1"));
    }

    #[test]
    fn odd_bytes_inside_the_token_are_kept_lossily() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_bytes(b"token=\xffabc").unwrap(),
        );

        assert_eq!(
            Handshake::from_headers(&headers).candidate_token(),
            Some("\u{fffd}abc")
        );
    }
}
