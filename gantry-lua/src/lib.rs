//! Gantry Lua Definitions
//!
//! Pipeline definitions can be written as Lua scripts that return a table.
//! This crate evaluates them in a restricted sandbox and turns the result into
//! the immutable `Pipeline` value graph from gantry-core.
//!
//! It includes:
//! - The definition sandbox with the `pipeline` helper module
//! - The parser from Lua tables to `Pipeline`
//! - A file loader accepting Lua or JSON definitions

pub mod loader;
pub mod parser;
pub mod sandbox;

pub use loader::load_pipeline_file;
pub use parser::parse_pipeline;
pub use sandbox::create_sandbox;
