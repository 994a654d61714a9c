//! Pool registry
//!
//! Loading and filtering of the pool universe the enumerator runs over.
//!
//! Author: AI-Generated
//! Created: 2026-07-13

pub mod loader;

pub use loader::PoolLoader;
