//! Definition file loading
//!
//! `.lua` files go through the Lua parser; anything else is read as the JSON
//! form of `Pipeline`. Both paths validate the result.

use anyhow::{Context, Result};
use gantry_core::domain::pipeline::Pipeline;
use std::path::Path;

use crate::parser::parse_pipeline;

/// Load and validate a pipeline definition from a file
pub fn load_pipeline_file(path: impl AsRef<Path>) -> Result<Pipeline> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read definition file: {}", path.display()))?;

    let is_lua = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("lua"));

    if is_lua {
        return parse_pipeline(&content);
    }

    let pipeline: Pipeline = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON definition: {}", path.display()))?;

    pipeline
        .validate()
        .with_context(|| format!("Invalid pipeline definition '{}'", pipeline.name))?;

    Ok(pipeline)
}
