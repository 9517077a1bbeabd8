//! Infrastructure layer for the agent chat loop.
//!
//! Implements the ports defined in `chatloop-core` against the real world:
//! a subprocess agent bridge, markdown/JSON conversation files, a platform
//! sound player, plus config loading and data-directory resolution.

pub mod agent;
pub mod audio;
pub mod config;
pub mod conversation;
pub mod paths;
pub mod pricing;
