//! # Domain Module
//!
//! Core types for the reputation monitor.

pub mod entities;
pub mod errors;
pub mod slashing;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use slashing::*;
pub use value_objects::*;
