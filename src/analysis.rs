//! Analysis chain assembly and execution
//!
//! Leaf-first:
//! - `spec`: component and pipeline descriptions
//! - `stream` / `token`: the char-level and token-level cursor interfaces
//! - `factory` / `registry`: named stage factories and their lookup
//! - `builtin`: the compiled-in component table
//! - `analyzer` / `cursor`: resolution of a spec and per-stream execution
//! - `fetch` / `library`: component libraries pulled from artifact repositories
//! - `args` / `config` / `output`: driver-facing helpers

pub mod analyzer;
pub mod args;
pub mod builtin;
pub mod config;
pub mod cursor;
pub mod error;
pub mod factory;
pub mod fetch;
pub mod library;
pub mod options;
pub mod output;
pub mod registry;
pub mod spec;
pub mod stream;
pub mod token;
