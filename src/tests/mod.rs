//! Test module for the load suite.
//!
//! - Integration tests (dev node, scenario loop, end-to-end ledger cleanup)

pub mod integration;
