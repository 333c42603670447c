//! Selection state and tree materialization for packing a directory into a
//! single LLM-ready document.

// Declare all modules as public so they can be used by the binary and tests.
pub mod app;
pub mod config;
pub mod core;
pub mod utils;
