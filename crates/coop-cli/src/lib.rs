//! coop-pilot CLI — command implementations and shared startup wiring.
//!
//! The binary (`coop-pilot`) is a thin wrapper around this library: it
//! parses arguments and hands off to `commands::*`, which wire together
//! `coop-core`'s matching engine, `coop-store`'s persistence layer, and
//! `coop-pipeline`'s orchestrator.

pub mod commands;
pub mod config;
pub mod embedding;
