//! `EdgeBox` envelope encryption and the small set of keyed hashes the rest
//! of the crate treats as primitives (§4.7).
//!
//! AES-256-CBC (PKCS7) plus an HMAC-SHA256 tag over `iv || ciphertext`. The
//! encryption and authentication subkeys are both derived from the caller's
//! 32-byte key via domain-separated HMAC, so a single `loginKey` yields two
//! independent-looking subkeys rather than reusing one key for both AES and
//! the MAC.

use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use unicode_normalization::UnicodeNormalization;

use crate::crypto::codecs;
use crate::error::{Error, ErrorKind};
use crate::types::envelope::EdgeBox;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

const IV_LEN: usize = 16;
const TAG_LEN: usize = 32;
const ENCRYPTION_TYPE: &str = "aes-cbc-hmac-sha256";

const AES_KEY_CONTEXT: &[u8] = b"edge-login-core:aes-key:v1";
const MAC_KEY_CONTEXT: &[u8] = b"edge-login-core:mac-key:v1";
const USERNAME_HASH_CONTEXT: &[u8] = b"edge-login-core:username-hash:v1";

fn subkeys(key: &[u8]) -> ([u8; 32], [u8; 32]) {
    (hmac_sha256(key, AES_KEY_CONTEXT), hmac_sha256(key, MAC_KEY_CONTEXT))
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    let result = mac.finalize().into_bytes();
    let mut out = [0u8; 32];
    out.copy_from_slice(&result);
    out
}

/// §3 invariant 3 / §9: the root `loginId` is `hashUsername(username)`. This
/// crate picks HMAC-SHA256 over scrypt for this derivation (see DESIGN.md).
pub fn hash_username(username: &str) -> [u8; 32] {
    let normalized: String = username.trim().nfkc().collect::<String>().to_lowercase();
    hmac_sha256(USERNAME_HASH_CONTEXT, normalized.as_bytes())
}

pub fn encrypt(plaintext: &[u8], key: &[u8]) -> EdgeBox {
    let (aes_key, mac_key) = subkeys(key);
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(aes_key.as_slice().into(), iv.as_slice().into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut tagged = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    tagged.extend_from_slice(&ciphertext);
    let mut mac_input = Vec::with_capacity(IV_LEN + ciphertext.len());
    mac_input.extend_from_slice(&iv);
    mac_input.extend_from_slice(&ciphertext);
    tagged.extend_from_slice(&hmac_sha256(&mac_key, &mac_input));

    EdgeBox {
        data_base64: codecs::base64_encode(&tagged),
        iv_base64: codecs::base64_encode(&iv),
        encryption_type: ENCRYPTION_TYPE.to_string(),
    }
}

pub fn encrypt_text(text: &str, key: &[u8]) -> EdgeBox {
    encrypt(text.as_bytes(), key)
}

pub fn decrypt(edge_box: &EdgeBox, key: &[u8]) -> Result<Vec<u8>, Error> {
    if edge_box.encryption_type != ENCRYPTION_TYPE {
        return Err(ErrorKind::KeyIntegrity(format!(
            "unsupported encryption type `{}`",
            edge_box.encryption_type
        ))
        .into());
    }
    let iv = codecs::base64_decode(&edge_box.iv_base64)?;
    if iv.len() != IV_LEN {
        return Err(ErrorKind::KeyIntegrity("invalid iv length".into()).into());
    }
    let tagged = codecs::base64_decode(&edge_box.data_base64)?;
    if tagged.len() < TAG_LEN {
        return Err(ErrorKind::KeyIntegrity("ciphertext truncated".into()).into());
    }
    let (ciphertext, tag) = tagged.split_at(tagged.len() - TAG_LEN);

    let (aes_key, mac_key) = subkeys(key);
    let mut mac_input = Vec::with_capacity(iv.len() + ciphertext.len());
    mac_input.extend_from_slice(&iv);
    mac_input.extend_from_slice(ciphertext);
    let expected_tag = hmac_sha256(&mac_key, &mac_input);

    if expected_tag.ct_eq(tag).unwrap_u8() == 0 {
        return Err(ErrorKind::KeyIntegrity("box authentication failed".into()).into());
    }

    let mut buf = ciphertext.to_vec();
    let plaintext = Aes256CbcDec::new(aes_key.as_slice().into(), iv.as_slice().into())
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|_| ErrorKind::KeyIntegrity("box padding is invalid".into()))?;
    Ok(plaintext.to_vec())
}

pub fn decrypt_text(edge_box: &EdgeBox, key: &[u8]) -> Result<String, Error> {
    let bytes = decrypt(edge_box, key)?;
    String::from_utf8(bytes).map_err(|_| ErrorKind::KeyIntegrity("box did not decrypt to utf-8".into()).into())
}
