//! Thin codec wrappers (§4.7, §6). Kept as free functions rather than trait
//! impls on `[u8]`/`str` since the underlying implementations are real
//! crates, not hand-rolled.

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;

use crate::error::{Error, ErrorKind};

pub fn base64_encode(bytes: &[u8]) -> String {
    B64.encode(bytes)
}

pub fn base64_decode(text: &str) -> Result<Vec<u8>, Error> {
    B64.decode(text)
        .map_err(|e| ErrorKind::InvalidStash(format!("invalid base64: {e}")).into())
}

pub fn base16_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

pub fn base16_decode(text: &str) -> Result<Vec<u8>, Error> {
    if text.len() % 2 != 0 {
        return Err(ErrorKind::InvalidStash("invalid hex: odd length".into()).into());
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16)
                .map_err(|e| ErrorKind::InvalidStash(format!("invalid hex: {e}")).into())
        })
        .collect()
}

pub fn base58_encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

pub fn base58_decode(text: &str) -> Result<Vec<u8>, Error> {
    bs58::decode(text)
        .into_vec()
        .map_err(|e| ErrorKind::InvalidStash(format!("invalid base58: {e}")).into())
}

pub fn base32_encode(bytes: &[u8]) -> String {
    data_encoding::BASE32_NOPAD.encode(bytes)
}

pub fn base32_decode(text: &str) -> Result<Vec<u8>, Error> {
    data_encoding::BASE32_NOPAD
        .decode(text.to_ascii_uppercase().as_bytes())
        .map_err(|e| ErrorKind::InvalidStash(format!("invalid base32: {e}")).into())
}
