//! Modular arithmetic over the full u64 range.
//!
//! Nothing here widens to u128. `mulmod` is binary double-and-add, and every
//! intermediate addition goes through `addmod`, which never overflows even
//! when the modulus is above 2^63.

/// `(a + b) mod m` for `a, b < m`.
#[inline]
fn addmod(a: u64, b: u64, m: u64) -> u64 {
    debug_assert!(a < m && b < m);
    // a + b >= m  <=>  a >= m - b, and m - b cannot underflow since b < m.
    if a >= m - b {
        a - (m - b)
    } else {
        a + b
    }
}

/// `(a * b) mod m` for any `a`, `b` and `m > 0`.
///
/// Decomposes `b` into bits; `a` is doubled modulo `m` at each step and
/// added into the accumulator when the bit is set.
///
/// # Panics
///
/// Panics if `m == 0`.
pub fn mulmod(a: u64, b: u64, m: u64) -> u64 {
    assert!(m > 0, "modulus must be positive");
    let mut a = a % m;
    let mut b = b;
    let mut acc = 0;
    while b > 0 {
        if b & 1 == 1 {
            acc = addmod(acc, a, m);
        }
        a = addmod(a, a, m);
        b >>= 1;
    }
    acc
}

/// Product of every integer in `[begin, end]`, reduced mod `m`.
///
/// An empty range (`begin > end`) yields the multiplicative identity `1 % m`.
/// Stops early once the accumulator hits zero.
pub fn range_product(begin: u64, end: u64, m: u64) -> u64 {
    assert!(m > 0, "modulus must be positive");
    let mut acc = 1 % m;
    if begin > end {
        return acc;
    }
    let mut i = begin;
    loop {
        acc = mulmod(acc, i, m);
        if acc == 0 || i == end {
            return acc;
        }
        i += 1;
    }
}

/// `k! mod m`, computed sequentially.
pub fn factorial_mod(k: u64, m: u64) -> u64 {
    range_product(1, k, m)
}
