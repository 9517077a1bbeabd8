//! The streaming response pipeline: event parsing, usage extraction and the
//! orchestrator that drives one query through every stage.

pub mod event_parser;
pub mod orchestrator;
pub mod usage_extractor;
