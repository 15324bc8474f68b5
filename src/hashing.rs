//! Hash functions and prime sizing shared by both tables.
//!
//! Tables never hash keys themselves: every slot or bucket index is derived
//! through [`primary_hash`], every probe step through [`secondary_hash`] and
//! every capacity through [`next_prime_at_or_above`]. All three are
//! deterministic, so a key's probe path for a given capacity can be computed
//! from the outside.

use std::hash::{DefaultHasher, Hash, Hasher};

/// Mixed into the hasher state before the key to decorrelate the step hash from the
/// primary hash.
const STEP_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Hashes `key` with the fixed-key default hasher, optionally salted.
fn raw_hash<K: Hash + ?Sized>(key: &K, salt: Option<u64>) -> u64 {
    let mut hasher = DefaultHasher::new();
    if let Some(salt) = salt {
        hasher.write_u64(salt);
    }
    key.hash(&mut hasher);
    hasher.finish()
}

/// Reduces `hash` into `[0, modulus)`. A zero modulus maps everything to 0.
fn reduce(hash: u64, modulus: usize) -> usize {
    let modulus = u64::try_from(modulus).unwrap_or(u64::MAX);
    hash.checked_rem(modulus).and_then(|index| usize::try_from(index).ok()).unwrap_or(0)
}

/// Home index of `key` in a table of `modulus` slots, in `[0, modulus)`.
#[must_use]
pub fn primary_hash<K: Hash + ?Sized>(key: &K, modulus: usize) -> usize {
    reduce(raw_hash(key, None), modulus)
}

/// Probe step of `key` in a table of `modulus` slots, in `[1, modulus)`.
///
/// Never returns 0. Tables with fewer than two slots get a step of 1.
#[must_use]
pub fn secondary_hash<K: Hash + ?Sized>(key: &K, modulus: usize) -> usize {
    let span = modulus.saturating_sub(1);
    if span == 0 {
        return 1;
    }
    reduce(raw_hash(key, Some(STEP_SALT)), span).saturating_add(1)
}

/// Returns true if `n` is prime.
#[must_use]
#[allow(clippy::arithmetic_side_effects)]
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut divisor: usize = 3;
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor = divisor.saturating_add(2);
    }
    true
}

/// Smallest prime that is at least `n` (and at least 2).
#[must_use]
pub fn next_prime_at_or_above(n: usize) -> usize {
    let mut candidate = n.max(2);
    while !is_prime(candidate) && candidate < usize::MAX {
        candidate = candidate.saturating_add(1);
    }
    candidate
}
