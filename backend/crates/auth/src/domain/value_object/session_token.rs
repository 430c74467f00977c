//! Session Token Value Object
//!
//! `"<session uuid>.<base64url HMAC-SHA256 of the uuid>"`. The signature
//! lets forged tokens be rejected without a cache lookup.

use std::fmt;

use kernel::id::SessionId;
use platform::crypto::{from_base64url, hmac_sign, hmac_verify, to_base64url};

#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn issue(secret: &[u8], session_id: &SessionId) -> Self {
        let id = session_id.to_string();
        let signature = hmac_sign(secret, id.as_bytes());
        Self(format!("{id}.{}", to_base64url(&signature)))
    }

    /// `None` for malformed tokens and bad signatures alike.
    pub fn verify(secret: &[u8], token: &str) -> Option<SessionId> {
        let (id, signature) = token.split_once('.')?;
        let signature = from_base64url(signature).ok()?;
        if !hmac_verify(secret, id.as_bytes(), &signature) {
            return None;
        }
        SessionId::parse_str(id).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// tokens are credentials
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}
