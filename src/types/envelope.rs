//! `EdgeBox` / `EdgeSnrp` — the two value types persisted on disk and over the
//! wire by every other component. See `crypto::envelope` for the operations
//! that produce and consume them.

use serde::{Deserialize, Serialize};

/// An authenticated-encryption envelope. Treated as an opaque value outside
/// of `crypto::envelope` — decrypt requires exactly the key that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeBox {
    /// Base64-encoded ciphertext (PKCS7-padded AES-CBC output).
    pub data_base64: String,
    /// Base64-encoded 16-byte IV.
    pub iv_base64: String,
    /// Algorithm tag, e.g. "aes-cbc-hmac-sha256".
    pub encryption_type: String,
}

/// Scrypt parameters, persisted verbatim on disk and over the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSnrp {
    /// Hex-encoded salt.
    pub salt_hex: String,
    pub n: u32,
    pub r: u32,
    pub p: u32,
}

impl EdgeSnrp {
    pub fn salt_bytes(&self) -> Result<Vec<u8>, crate::error::Error> {
        crate::crypto::codecs::base16_decode(&self.salt_hex)
    }
}
