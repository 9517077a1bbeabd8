//! Agent adapters.

pub mod process;

pub use process::ProcessAgent;
