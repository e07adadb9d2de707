use super::*;

mod tables;

use tables::{CACHE_SIZES, DATASET_SIZES};

pub(crate) const HASH_BYTES: u64 = 64;
pub(crate) const MIX_BYTES: u64 = 128;

const CACHE_BYTES_INIT: u64 = 1 << 24;
const CACHE_BYTES_GROWTH: u64 = 1 << 17;
const DATASET_BYTES_INIT: u64 = 1 << 30;
const DATASET_BYTES_GROWTH: u64 = 1 << 23;

const PRECOMPUTED_EPOCHS: u64 = CACHE_SIZES.len() as u64;

static CACHE_EXTENSIONS: LazyLock<Mutex<HashMap<u64, u64>>> = LazyLock::new(Default::default);
static DATASET_EXTENSIONS: LazyLock<Mutex<HashMap<u64, u64>>> = LazyLock::new(Default::default);

/// Verification cache size in bytes for the epoch containing `block`.
pub fn cache_size(block: u64) -> u64 {
    cache_size_by_epoch(block / EPOCH_LENGTH)
}

/// Mining dataset size in bytes for the epoch containing `block`.
pub fn dataset_size(block: u64) -> u64 {
    dataset_size_by_epoch(block / EPOCH_LENGTH)
}

pub fn cache_size_by_epoch(epoch: u64) -> u64 {
    if epoch < PRECOMPUTED_EPOCHS {
        return CACHE_SIZES[epoch as usize];
    }
    extended(&CACHE_EXTENSIONS, epoch, calc_cache_size)
}

pub fn dataset_size_by_epoch(epoch: u64) -> u64 {
    if epoch < PRECOMPUTED_EPOCHS {
        return DATASET_SIZES[epoch as usize];
    }
    extended(&DATASET_EXTENSIONS, epoch, calc_dataset_size)
}

/// The effective epoch used for sizing: growth freezes at `stunt` when it is
/// non-zero, otherwise the epoch passes through unmodified.
pub fn stunted_epoch(epoch: u64, stunt: u64) -> u64 {
    if stunt != 0 { epoch.min(stunt) } else { epoch }
}

fn extended(memo: &Mutex<HashMap<u64, u64>>, epoch: u64, calc: fn(u64) -> u64) -> u64 {
    *memo.lock().entry(epoch).or_insert_with(|| calc(epoch))
}

/// Linear growth per epoch, backed off to the nearest size whose item count
/// is prime so that index distribution over the artifact stays uniform.
fn calc_cache_size(epoch: u64) -> u64 {
    let mut size = CACHE_BYTES_INIT + CACHE_BYTES_GROWTH * epoch - HASH_BYTES;
    while !is_prime(size / HASH_BYTES) {
        size -= 2 * HASH_BYTES;
    }
    size
}

fn calc_dataset_size(epoch: u64) -> u64 {
    let mut size = DATASET_BYTES_INIT + DATASET_BYTES_GROWTH * epoch - MIX_BYTES;
    while !is_prime(size / MIX_BYTES) {
        size -= 2 * MIX_BYTES;
    }
    size
}

/// Deterministic Miller-Rabin. The witness set covers the full u64 range.
fn is_prime(n: u64) -> bool {
    const WITNESSES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

    if n < 2 {
        return false;
    }
    for p in WITNESSES {
        if n % p == 0 {
            return n == p;
        }
    }

    let trailing = (n - 1).trailing_zeros();
    let odd = (n - 1) >> trailing;

    'witness: for a in WITNESSES {
        let mut x = pow_mod(a, odd, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..trailing {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }

    true
}

fn mul_mod(a: u64, b: u64, modulus: u64) -> u64 {
    (u128::from(a) * u128::from(b) % u128::from(modulus)) as u64
}

fn pow_mod(mut base: u64, mut exponent: u64, modulus: u64) -> u64 {
    let mut result = 1;
    base %= modulus;
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = mul_mod(result, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exponent >>= 1;
    }
    result
}

/// Startup sanity check: the embedded tables must agree with the derivation
/// rule and grow monotonically.
pub(crate) fn verify_tables() -> Result {
    for epoch in 0..8 {
        ensure!(
            CACHE_SIZES[epoch as usize] == calc_cache_size(epoch)
                && DATASET_SIZES[epoch as usize] == calc_dataset_size(epoch),
            error::ConfigSnafu {
                reason: format!("size table disagrees with derivation rule at epoch {epoch}"),
            }
        );
    }

    ensure!(
        CACHE_SIZES.windows(2).all(|pair| pair[0] <= pair[1])
            && DATASET_SIZES.windows(2).all(|pair| pair[0] <= pair[1]),
        error::ConfigSnafu {
            reason: "size tables are not monotonically non-decreasing",
        }
    );

    Ok(())
}
