#![deny(unused)]
//! Policy decision engine for Cachewarden.
//!
//! This crate provides:
//! - Hard-block classification (credential, identifier, temporal,
//!   personal-context content must never reach the remote cache)
//! - Whitelist category resolution with fixed similarity thresholds
//! - Data-driven rule sets, overridable without a rebuild

pub mod classifier;
pub mod rules;
pub mod whitelist;

pub use classifier::Classifier;
pub use rules::{BlockRule, RuleFile, RuleSet};
pub use whitelist::{effective_threshold, CategoryResolver};
