use std::fmt;

use hmac::{Hmac, Mac};

use sha2::Sha256;

use secrecy::Secret;

mod token;

pub use token::{Token, TokenError, TokenResult};

/// Shortest secret accepted for signing session tokens
pub const MIN_SECRET_KEY_LEN: usize = 32;

/// HMAC-SHA256 key used to sign and verify session tokens
#[derive(Clone)]
pub struct SigningKey(Hmac<Sha256>);

impl SigningKey {
    pub fn new(key: &Secret<String>) -> anyhow::Result<Self> {
        use secrecy::ExposeSecret;

        let key = key.expose_secret().as_bytes();
        anyhow::ensure!(
            key.len() >= MIN_SECRET_KEY_LEN,
            "Secret key must be at least {} bytes long",
            MIN_SECRET_KEY_LEN
        );
        let hmac = Hmac::new_from_slice(key)?;

        Ok(Self(hmac))
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey([REDACTED])")
    }
}

impl AsRef<Hmac<Sha256>> for SigningKey {
    fn as_ref(&self) -> &Hmac<Sha256> {
        &self.0
    }
}
