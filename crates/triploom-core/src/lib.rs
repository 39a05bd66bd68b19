//! Shared configuration and error types for the TripLoom backend.

pub mod config;
pub mod error;

pub use config::TriploomConfig;
pub use error::{Result, TriploomError};
