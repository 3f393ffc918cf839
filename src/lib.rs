//! Vip Gate - payment-gated access to a private channel.
//!
//! An order is created, a PIX payment intent is opened at an external
//! gateway, and confirmation arrives through a user poll or a gateway
//! webhook. Both channels converge on one reconciliation function that
//! finalizes the order through compare-and-set and grants access exactly
//! once.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
