//! Range partitioner — splits an inclusive integer range into contiguous,
//! non-overlapping blocks whose sizes differ by at most one.
//!
//! With `len` numbers and `n` workers, `base = len / n` and `rem = len % n`;
//! the first `rem` blocks take `base + 1` numbers, the rest take `base`.
//! Blocks are produced in increasing order, so the split is deterministic.
//!
//! When there are fewer numbers than workers, only `len` single-number blocks
//! are produced. Surplus workers get nothing rather than an empty range, so
//! every returned block satisfies `begin <= end`.

use serde::{Deserialize, Serialize};

/// One inclusive block `[begin, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub begin: u64,
    pub end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl Block {
    /// Number of integers covered by this block.
    pub fn len(&self) -> u64 {
        self.end - self.begin + 1
    }
}

/// Partition `[1, k]` across `n` workers.
pub fn partition(k: u64, n: usize) -> Vec<Block> {
    split_range(1, k, n)
}

/// Partition `[begin, end]` into at most `n` blocks.
///
/// Returns an empty vec for an empty range or `n == 0`.
pub fn split_range(begin: u64, end: u64, n: usize) -> Vec<Block> {
    if begin > end || n == 0 {
        return Vec::new();
    }

    // u128 so that [0, u64::MAX] (2^64 numbers) does not overflow.
    let len = (end - begin) as u128 + 1;
    let blocks = len.min(n as u128);
    let base = len / blocks;
    let rem = len % blocks;

    let mut out = Vec::with_capacity(blocks as usize);
    let mut start = begin as u128;
    for i in 0..blocks {
        let size = if i < rem { base + 1 } else { base };
        let stop = start + size - 1;
        out.push(Block {
            begin: start as u64,
            end: stop as u64,
        });
        start = stop + 1;
    }
    out
}
