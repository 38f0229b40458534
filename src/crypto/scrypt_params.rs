//! Scrypt parameter chooser (§4.6). Given a single benchmark latency for
//! `n=16384, r=8, p=1` on this device and a target latency, derive
//! `(n, r, p)`. The literals are fixed deliberately to cap worst-case cost on
//! low-end devices — see DESIGN.md and SPEC_FULL.md §9 for why `r` never
//! moves off its starting value.

use rand::RngCore;

const N_START: u32 = 1 << 14; // 16384
const R_START: u32 = 8;
/// Cap on `r`. Equal to `R_START` by design parity with the source this was
/// distilled from — the growth branch below is reachable but never changes
/// `r`. Left as a named, adjustable constant rather than removed.
const R_CAP: u32 = 8;
const N_CAP: u32 = 1 << 17; // 131072
const P_CAP: u32 = 64;

const FALLBACK_N: u32 = 1 << 17;
const FALLBACK_R: u32 = 8;
const FALLBACK_P: u32 = 64;

pub const SALT_LEN: usize = 32;

/// Derives `(n, r, p)` for a target latency given a benchmark of the
/// baseline parameters on this device.
pub fn choose_scrypt_params(bench_ms: u64, target_ms: u64) -> (u32, u32, u32) {
    if bench_ms == 0 {
        return (FALLBACK_N, FALLBACK_R, FALLBACK_P);
    }

    let mut budget = target_ms as f64 / bench_ms as f64;

    let r_guess = (R_START as f64 * budget).floor() as i64;
    let r = (r_guess.max(R_START as i64).min(R_CAP as i64)) as u32;
    budget /= r as f64 / R_START as f64;

    let mut n = N_START;
    while budget >= 2.0 && n < N_CAP {
        n *= 2;
        budget /= 2.0;
    }

    let p_guess = budget.floor() as i64;
    let p = (p_guess.max(1).min(P_CAP as i64)) as u32;

    (n, r, p)
}

/// 32 random salt bytes, generated fresh for every scrypt-parameterized box.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}
