pub mod codecs;
pub mod envelope;
pub mod hotp;
pub mod scrypt_params;
pub mod scrypt_queue;

pub use envelope::{decrypt, decrypt_text, encrypt, encrypt_text, hash_username, hmac_sha256};
pub use hotp::{fix_otp_key, hotp, totp};
