//! Shared domain types for the agent chat loop.
//!
//! This crate contains the data passed between the streaming pipeline stages:
//! classified stream events, token usage reports, processed responses, turn
//! outcomes, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod session;
pub mod turn;
pub mod usage;
