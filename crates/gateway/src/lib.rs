#![deny(unused)]
//! Policy gateway for Cachewarden.
//!
//! Composes the content classifier, the whitelist resolver, and a
//! `CacheService` transport into the enforced operations exposed to
//! callers. The central invariant lives here: blocked content never
//! reaches the network layer, on read paths as well as write paths.

pub mod gateway;
pub mod logging;

pub use gateway::PolicyGateway;
pub use logging::configure_tracing;
