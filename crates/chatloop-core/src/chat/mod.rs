//! Session state, transcript composition and the persistence hook.

pub mod session;
pub mod store;
pub mod transcript;
