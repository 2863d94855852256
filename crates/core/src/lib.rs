#![deny(unused)]
//! Core types, traits, and error definitions for Cachewarden.
//!
//! This crate provides the foundational building blocks shared by the
//! policy, client, and gateway layers: the policy data model, the
//! `CacheService` seam to the remote cache, configuration loading, and
//! mock implementations for testing.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::CacheService;
pub use types::*;
