//! frame-relay daemon library
//!
//! This crate provides the core functionality for the relay:
//! - Envelope codec for agent frames
//! - Mode dispatch and the register / fetch / submit handlers
//! - Core store client trait and its HTTP implementation
//! - TCP transport for agent connections

pub mod backend;
pub mod commands;
pub mod config;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod relay;
pub mod transport;

#[cfg(test)]
mod testing;
