//! Field-level encryption seam used by the hosted store.
//!
//! The codec is opaque to the sync engine: repositories encrypt on the way
//! out and decrypt on the way in, so the engine only sees plaintext.

use crate::error::Result;

/// Encrypts and decrypts individual text fields
pub trait FieldCodec: Send + Sync {
    /// Returns the value to store in the visible column and the optional
    /// ciphertext to store alongside it.
    fn encrypt(&self, plain: &str) -> Result<(String, Option<String>)>;

    /// Recovers the plaintext from the visible value and optional ciphertext.
    fn decrypt(&self, visible: &str, cipher: Option<&str>) -> Result<String>;
}

/// Identity codec: values are stored in the clear
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCodec;

impl FieldCodec for PlainCodec {
    fn encrypt(&self, plain: &str) -> Result<(String, Option<String>)> {
        Ok((plain.to_string(), None))
    }

    fn decrypt(&self, visible: &str, cipher: Option<&str>) -> Result<String> {
        Ok(cipher.unwrap_or(visible).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_codec_round_trips() {
        let (visible, cipher) = PlainCodec.encrypt("secret plan").unwrap();
        assert_eq!(visible, "secret plan");
        assert!(cipher.is_none());
        assert_eq!(PlainCodec.decrypt(&visible, None).unwrap(), "secret plan");
    }
}
