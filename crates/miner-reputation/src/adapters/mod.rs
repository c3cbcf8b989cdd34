//! # Adapters
//!
//! Implementations of the outbound ports against real chain nodes.

pub mod lotus;

pub use lotus::{LotusConfig, LotusGateway};
