//! kfact wire format — the fixed-size frames exchanged between the
//! coordinator and a worker.
//!
//! One TCP connection carries exactly one request and one response:
//!
//! ```text
//! request  (24 bytes): begin u64 | end u64 | modulus u64
//! response  (8 bytes): product u64
//! ```
//!
//! Every integer is big-endian. There is no length prefix, no version byte
//! and no framing beyond the fixed sizes; changing any field is a breaking
//! change for every deployed worker.
//!
//! Frames use zerocopy's byte-order-aware integers, so layout is alignment
//! free and there is no unsafe code in this module.

use static_assertions::assert_eq_size;
use zerocopy::byteorder::{BigEndian, U64};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

type U64Be = U64<BigEndian>;

/// Size of an encoded request in bytes.
pub const REQUEST_LEN: usize = 24;

/// Size of an encoded response in bytes.
pub const RESPONSE_LEN: usize = 8;

/// Default TCP port a worker listens on.
pub const DEFAULT_WORKER_PORT: u16 = 20001;

// ── Request ───────────────────────────────────────────────────────────────────

/// Ask a worker for the product of `[begin, end]` modulo `modulus`.
///
/// Wire size: 24 bytes.
#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct FactorialRequest {
    begin: U64Be,
    end: U64Be,
    modulus: U64Be,
}

assert_eq_size!(FactorialRequest, [u8; REQUEST_LEN]);

impl FactorialRequest {
    pub fn new(begin: u64, end: u64, modulus: u64) -> Self {
        Self {
            begin: U64Be::new(begin),
            end: U64Be::new(end),
            modulus: U64Be::new(modulus),
        }
    }

    pub fn begin(&self) -> u64 {
        self.begin.get()
    }

    pub fn end(&self) -> u64 {
        self.end.get()
    }

    pub fn modulus(&self) -> u64 {
        self.modulus.get()
    }

    pub fn encode(&self) -> [u8; REQUEST_LEN] {
        let mut buf = [0u8; REQUEST_LEN];
        buf.copy_from_slice(self.as_bytes());
        buf
    }

    /// Parse a request frame. The slice must be exactly [`REQUEST_LEN`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        Self::read_from(bytes).ok_or(WireError::FrameLength {
            expected: REQUEST_LEN,
            got: bytes.len(),
        })
    }

    /// Reject requests a worker cannot serve.
    pub fn validate(&self) -> Result<(), WireError> {
        if self.modulus() == 0 {
            return Err(WireError::ZeroModulus);
        }
        if self.begin() > self.end() {
            return Err(WireError::EmptyRange {
                begin: self.begin(),
                end: self.end(),
            });
        }
        Ok(())
    }
}

// ── Response ──────────────────────────────────────────────────────────────────

/// A worker's partial product.
///
/// Wire size: 8 bytes.
#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct FactorialResponse {
    product: U64Be,
}

assert_eq_size!(FactorialResponse, [u8; RESPONSE_LEN]);

impl FactorialResponse {
    pub fn new(product: u64) -> Self {
        Self {
            product: U64Be::new(product),
        }
    }

    pub fn product(&self) -> u64 {
        self.product.get()
    }

    pub fn encode(&self) -> [u8; RESPONSE_LEN] {
        let mut buf = [0u8; RESPONSE_LEN];
        buf.copy_from_slice(self.as_bytes());
        buf
    }

    /// Parse a response frame. The slice must be exactly [`RESPONSE_LEN`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        Self::read_from(bytes).ok_or(WireError::FrameLength {
            expected: RESPONSE_LEN,
            got: bytes.len(),
        })
    }

    /// A product is a residue, so it must be below the modulus it was taken under.
    pub fn check_residue(&self, modulus: u64) -> Result<u64, WireError> {
        let product = self.product();
        if product >= modulus {
            return Err(WireError::ResidueOutOfRange { product, modulus });
        }
        Ok(product)
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when interpreting wire-format data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("frame is {got} bytes, expected {expected}")]
    FrameLength { expected: usize, got: usize },

    #[error("modulus must be positive")]
    ZeroModulus,

    #[error("empty range: begin {begin} > end {end}")]
    EmptyRange { begin: u64, end: u64 },

    #[error("product {product} is not a residue modulo {modulus}")]
    ResidueOutOfRange { product: u64, modulus: u64 },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
