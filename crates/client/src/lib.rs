#![deny(unused)]
//! Stateless HTTP mediator for the remote semantic cache service.

pub mod remote;
pub mod retry;

pub use remote::RemoteCacheClient;
pub use retry::RetryPolicy;
