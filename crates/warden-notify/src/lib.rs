//! # warden-notify
//!
//! Rate-limited notification fan-out for the Warden governance engine.
//!
//! The engine decides *when* to notify and formats a channel-agnostic
//! message; actual delivery is an external transport implementing
//! [`warden_core::traits::NotificationChannel`]. Channel failures are
//! isolated, and a sliding one-minute window caps total volume.

pub mod manager;

pub use manager::NotificationManager;
