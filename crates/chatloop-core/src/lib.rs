//! Streaming response pipeline for the agent chat loop.
//!
//! This crate defines the pipeline stages (event parser, usage extractor,
//! format post-processor, render strategy, session accumulator, response
//! orchestrator) and the "ports" they need: the agent, the transcript store,
//! the markdown renderer, the progress indicator display and the notifier.
//! It depends only on `chatloop-types` -- never on `chatloop-infra`.

pub mod agent;
pub mod chat;
pub mod format;
pub mod indicator;
pub mod notify;
pub mod render;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_support;
