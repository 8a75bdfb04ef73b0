use crate::storage::{clear_token, load_token, save_token};
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

/// Gate for everything that talks to the backend.
///
/// Holds the bearer token and knows, without a network round trip, whether
/// it is still usable. All other components treat "no valid session" as
/// "no further gateway calls"; the router redirects to the login page.
#[derive(Clone, Debug, Default)]
pub(crate) struct SessionGuard {
    token: Option<String>,
}

#[derive(Deserialize)]
struct TokenClaims {
    /// Expiry, seconds since the epoch.
    exp: i64,
}

/// Reads the `exp` claim out of a JWT-shaped token without verifying the
/// signature. Verification is the backend's job; the client only needs to
/// know whether presenting the token is pointless.
pub(crate) fn decode_expiry_ms(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
    Some(claims.exp.checked_mul(1000)?)
}

impl SessionGuard {
    /// Classifies a stored token against the current clock.
    ///
    /// Expired and malformed tokens are dropped on the spot, so the guard is
    /// never left holding a credential it cannot vouch for.
    pub fn from_token(token: Option<String>, now_ms: i64) -> Self {
        let token = token.filter(|t| matches!(decode_expiry_ms(t), Some(exp) if exp > now_ms));
        Self { token }
    }

    /// Restores the session from localStorage at startup. A token that fails
    /// the expiry check is erased from storage, not just ignored.
    pub fn load() -> Self {
        let stored = load_token();
        let had_stored = stored.is_some();
        let guard = Self::from_token(stored, crate::util::now_ms());
        if had_stored && guard.token.is_none() {
            clear_token();
        }
        guard
    }

    pub fn is_valid(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn establish(&mut self, token: String) {
        save_token(&token);
        self.token = Some(token);
    }

    pub fn clear(&mut self) {
        self.token = None;
        clear_token();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_exp(exp_secs: i64) -> String {
        let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::json!({ "exp": exp_secs, "user_id": 1 }).to_string());
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn decodes_expiry_from_payload() {
        let token = token_with_exp(1_700_000_000);
        assert_eq!(decode_expiry_ms(&token), Some(1_700_000_000_000));
    }

    #[test]
    fn fresh_token_is_valid() {
        let now = 1_000_000_000_000;
        let token = token_with_exp(now / 1000 + 3600);
        let guard = SessionGuard::from_token(Some(token), now);
        assert!(guard.is_valid());
    }

    #[test]
    fn expired_token_is_discarded() {
        let now = 1_000_000_000_000;
        let token = token_with_exp(now / 1000 - 60);
        let guard = SessionGuard::from_token(Some(token), now);
        assert!(!guard.is_valid());
        assert!(guard.token().is_none());
    }

    #[test]
    fn malformed_token_is_treated_like_expired() {
        for junk in ["", "not-a-jwt", "a.b.c", "a.!!!.c"] {
            let guard = SessionGuard::from_token(Some(junk.to_string()), 0);
            assert!(!guard.is_valid(), "token {junk:?} should be rejected");
        }
    }

    #[test]
    fn absent_token_is_unauthenticated() {
        let guard = SessionGuard::from_token(None, 0);
        assert!(!guard.is_valid());
    }
}
