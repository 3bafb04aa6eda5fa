use std::str::FromStr;

use hmac::Mac;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use chrono::{DateTime, TimeZone, Utc};

use base64::{
    alphabet,
    engine::{self, general_purpose},
    Engine as _,
};

lazy_static::lazy_static! {
    // URL-safe base64 without padding, so tokens can travel in headers untouched
    static ref BASE64_ENGINE: engine::GeneralPurpose =
        engine::GeneralPurpose::new(&alphabet::URL_SAFE, general_purpose::NO_PAD);
}

/// Various errors that can occur when handling tokens
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token signature does not match")]
    SignatureMismatch,
    #[error("Token is expired")]
    Expired,
    #[error("Failed to decode or encode token")]
    DecodeEncodeError,
}

impl From<std::str::Utf8Error> for TokenError {
    fn from(_e: std::str::Utf8Error) -> Self {
        Self::DecodeEncodeError
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(_e: serde_json::Error) -> Self {
        Self::DecodeEncodeError
    }
}

impl From<base64::DecodeError> for TokenError {
    fn from(_e: base64::DecodeError) -> Self {
        Self::DecodeEncodeError
    }
}

pub type TokenResult<T> = Result<T, TokenError>;

/// A serialized, signed token of the form `<base64 message>.<base64 signature>`
#[derive(Debug, Clone, PartialEq)]
pub struct Token(String);

impl Token {
    /// Sign `payload` so that it stops verifying after `expires_at`
    pub fn sign<T, K>(key: &K, payload: &T, expires_at: DateTime<Utc>) -> TokenResult<Self>
    where
        T: Serialize,
        K: Mac + Clone,
    {
        let msg = serde_json::to_string(&TokenMessage {
            exp: expires_at.timestamp(),
            data: payload,
        })?;
        let sig = sign_message(key, msg.as_bytes());

        Ok(Self(format!(
            "{}.{}",
            BASE64_ENGINE.encode(msg),
            BASE64_ENGINE.encode(sig)
        )))
    }

    /// Verify the signature and expiry against `now`, then decode the payload
    pub fn verify<T, K>(&self, key: &K, now: DateTime<Utc>) -> TokenResult<T>
    where
        T: DeserializeOwned,
        K: Mac + Clone,
    {
        let (msg, sig) = self.split().ok_or(TokenError::DecodeEncodeError)?;
        let msg = BASE64_ENGINE.decode(msg)?;
        let sig = BASE64_ENGINE.decode(sig)?;

        // Nothing is parsed until the signature checks out
        verify_message(key, &msg, &sig)?;

        let msg: TokenMessage<T> = serde_json::from_str(std::str::from_utf8(&msg)?)?;
        if msg.is_expired(now) {
            Err(TokenError::Expired)
        } else {
            Ok(msg.data)
        }
    }

    fn split(&self) -> Option<(&str, &str)> {
        let (msg, sig) = self.0.split_once('.')?;
        if msg.is_empty() || sig.is_empty() {
            return None;
        }
        Some((msg, sig))
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::DecodeEncodeError);
        }
        Ok(Self(token.to_string()))
    }
}

/// Signed envelope: expiry timestamp plus the payload
#[derive(Debug, Serialize, Deserialize)]
struct TokenMessage<T> {
    exp: i64,
    data: T,
}

impl<T> TokenMessage<T> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        Utc.timestamp_opt(self.exp, 0u32)
            .earliest()
            // Unrepresentable timestamps count as expired
            .map_or(true, |exp| now >= exp)
    }
}

fn sign_message<K>(key: &K, msg: &[u8]) -> Vec<u8>
where
    K: Mac + Clone,
{
    key.clone().chain_update(msg).finalize().into_bytes().to_vec()
}

/// Constant-time signature comparison
fn verify_message<K>(key: &K, msg: &[u8], signature: &[u8]) -> TokenResult<()>
where
    K: Mac + Clone,
{
    key.clone()
        .chain_update(msg)
        .verify_slice(signature)
        .map_err(|_| TokenError::SignatureMismatch)
}
