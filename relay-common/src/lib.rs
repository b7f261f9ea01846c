//! Shared types and errors for the VerusID login relay

pub mod error;
pub mod types;

pub use error::{RelayError, Result};
