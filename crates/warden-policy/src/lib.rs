//! # warden-policy
//!
//! Governance configuration loading and boundary enforcement for the
//! Warden engine.
//!
//! ## Overview
//!
//! This crate provides two things:
//!
//! - [`config`] — TOML loading for
//!   [`warden_contracts::config::GovernanceConfig`]. Every field has a
//!   default, so a config file only names what it overrides.
//! - [`BoundaryChecker`] — the [`warden_core::traits::BoundaryGuard`]
//!   implementation: configured numeric and categorical policy limits
//!   (financial caps, per-category caps, time-of-day restrictions)
//!   enforced against running daily usage counters.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use warden_policy::{config, BoundaryChecker};
//!
//! let cfg = config::from_file(Path::new("warden.toml"))?;
//! let boundaries = BoundaryChecker::new(cfg.boundaries.clone());
//! // Pass `boundaries` to `warden_core::DecisionRouter::new(...)`.
//! ```

pub mod boundary;
pub mod config;

pub use boundary::BoundaryChecker;
