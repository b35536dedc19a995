//! Aggregator — folds partial products into the job's final value.
//!
//! Only `Ok` results contribute. A failed or timed-out task is absent from
//! the product, not a zero factor. Multiplication mod M is commutative and
//! associative, so report order does not matter.

use serde::{Deserialize, Serialize};

use kfact_core::mulmod;

use crate::job_types::TaskResult;

/// Folded value plus how many tasks it is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregate {
    pub value: u64,
    pub successful: usize,
    pub total: usize,
}

impl Aggregate {
    pub fn is_complete(&self) -> bool {
        self.successful == self.total
    }
}

/// Multiply every successful partial product modulo `modulus`, starting
/// from `1 % modulus`.
pub fn aggregate(results: &[TaskResult], modulus: u64) -> Aggregate {
    let mut value = 1 % modulus;
    let mut successful = 0;
    for product in results.iter().filter_map(TaskResult::partial_product) {
        value = mulmod(value, product, modulus);
        successful += 1;
    }
    Aggregate {
        value,
        successful,
        total: results.len(),
    }
}
