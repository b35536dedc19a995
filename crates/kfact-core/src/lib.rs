//! kfact-core — arithmetic, range partitioning, wire format, and configuration.
//! All other kfact crates depend on this one.

pub mod arith;
pub mod config;
pub mod endpoint;
pub mod partition;
pub mod wire;

pub use arith::{factorial_mod, mulmod, range_product};
pub use endpoint::{Endpoint, EndpointError, ServerList};
pub use partition::{partition, split_range, Block};
