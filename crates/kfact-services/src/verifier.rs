//! Sequential cross-check of a distributed result. Diagnostic only.

use serde::{Deserialize, Serialize};

use kfact_core::factorial_mod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// `k! mod M` computed on this machine.
    pub expected: u64,
    /// The aggregated value under test.
    pub actual: u64,
    pub matches: bool,
}

/// Recompute `k! mod modulus` sequentially and compare with `actual`.
///
/// Costs O(k) multiplications.
pub fn verify(k: u64, modulus: u64, actual: u64) -> Verification {
    let expected = factorial_mod(k, modulus);
    Verification {
        expected,
        actual,
        matches: expected == actual,
    }
}
