//! Core build orchestration.

pub mod assembler;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod loader;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod types;
