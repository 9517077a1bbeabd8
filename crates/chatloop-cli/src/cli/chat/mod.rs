//! Interactive chat loop.
//!
//! Wires a subprocess agent into the response orchestrator and runs the REPL:
//! built-in commands, multi-line entry, copy commands, thinking spinner,
//! markdown rendering, conversation saving and the exit summary. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod copy;
pub mod input;
pub mod loop_runner;
pub mod markdown;
pub mod multiline;
pub mod spinner;
pub mod summary;
