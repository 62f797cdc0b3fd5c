//! smake: declarative build orchestrator.
//!
//! Discovers smake.yaml files, resolves definitions into builds and targets,
//! and runs a named target under a mode with a concurrency hint.

pub mod cli;
pub mod core;
pub mod transport;
