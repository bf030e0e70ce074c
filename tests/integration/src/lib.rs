//! Integration test utilities for the messenger
//!
//! This crate provides helpers for running end-to-end scenarios with
//! several simulated devices sharing one in-memory backend.

pub mod helpers;
pub mod fixtures;

pub use helpers::*;
pub use fixtures::*;
