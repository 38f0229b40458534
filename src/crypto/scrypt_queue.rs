//! Serializes scrypt calls through a one-at-a-time queue (§5): a new call
//! waits for the currently running one to settle before starting, so
//! memory-hard work never runs concurrently and pins the device.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::crypto::codecs;
use crate::error::{Error, ErrorKind};
use crate::types::envelope::EdgeSnrp;

#[derive(Clone)]
pub struct ScryptQueue {
    lock: Arc<Mutex<()>>,
}

impl Default for ScryptQueue {
    fn default() -> Self {
        ScryptQueue {
            lock: Arc::new(Mutex::new(())),
        }
    }
}

impl ScryptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one scrypt derivation, waiting for any in-flight derivation to
    /// finish first. `dklen` is the output key length in bytes.
    pub async fn derive(&self, password: &[u8], snrp: &EdgeSnrp, dklen: usize) -> Result<Vec<u8>, Error> {
        let _permit = self.lock.lock().await;
        derive_sync(password, snrp, dklen)
    }
}

fn derive_sync(password: &[u8], snrp: &EdgeSnrp, dklen: usize) -> Result<Vec<u8>, Error> {
    let salt = snrp.salt_bytes()?;
    let log_n = (31 - snrp.n.leading_zeros()) as u8;
    if 1u32 << log_n != snrp.n {
        return Err(ErrorKind::InvalidStash("scrypt n must be a power of two".into()).into());
    }
    let params = scrypt::Params::new(log_n, snrp.r, snrp.p, dklen)
        .map_err(|e| ErrorKind::InvalidStash(format!("invalid scrypt params: {e}")))?;
    let mut out = vec![0u8; dklen];
    scrypt::scrypt(password, &salt, &params, &mut out)
        .map_err(|e| ErrorKind::InvalidStash(format!("scrypt derivation failed: {e}")))?;
    Ok(out)
}

/// Builds a fresh `EdgeSnrp` with a random salt and the given cost
/// parameters, as produced by `scrypt_params::choose_scrypt_params`.
pub fn make_snrp(n: u32, r: u32, p: u32) -> EdgeSnrp {
    let salt = crate::crypto::scrypt_params::generate_salt();
    EdgeSnrp {
        salt_hex: codecs::base16_encode(&salt),
        n,
        r,
        p,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn derives_a_key_of_the_requested_length() {
        let snrp = make_snrp(16384, 8, 1);
        let queue = ScryptQueue::new();
        let key = queue.derive(b"hunter2", &snrp, 32).await.unwrap();
        assert_eq!(key.len(), 32);
    }

    #[tokio::test]
    async fn is_deterministic_for_the_same_inputs() {
        let snrp = make_snrp(16384, 8, 1);
        let queue = ScryptQueue::new();
        let a = queue.derive(b"hunter2", &snrp, 32).await.unwrap();
        let b = queue.derive(b"hunter2", &snrp, 32).await.unwrap();
        assert_eq!(a, b);
    }
}
