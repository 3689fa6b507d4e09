//! # warden-contracts
//!
//! Shared types, schemas, and contracts for the Warden governance engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions, configuration schema, and error types.

pub mod action;
pub mod approval;
pub mod audit;
pub mod boundary;
pub mod config;
pub mod decision;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod risk;
