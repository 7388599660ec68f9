//! Pipeline definition parser
//!
//! Evaluates a Lua pipeline definition in the sandbox and converts the
//! returned table into a validated `Pipeline`.

use anyhow::{Context, Result};
use gantry_core::domain::action::{Action, ActionKind, DEFAULT_RUN_ORDER, EnvValue};
use gantry_core::domain::pipeline::{Pipeline, Stage};
use mlua::{Table, Value};
use std::collections::BTreeMap;

use crate::sandbox::create_sandbox;

/// Parse and validate a pipeline definition from Lua source code
///
/// # Errors
/// Returns an error if:
/// - The Lua source is invalid or does not return a table
/// - Required fields are missing (name, stages, actions, action kind)
/// - Field types are incorrect
/// - The resulting pipeline fails definition validation
///
/// # Example
/// ```no_run
/// use gantry_lua::parser::parse_pipeline;
///
/// let source = r#"
///     return pipeline.define {
///         name = "app",
///         stages = {
///             { name = "Source", actions = {
///                 pipeline.source { name = "Source", outputs = { "source" } },
///             } },
///             { name = "Build", actions = {
///                 pipeline.build { name = "Build", input = "source", command = "make" },
///             } },
///         },
///     }
/// "#;
///
/// let pipeline = parse_pipeline(source)?;
/// assert_eq!(pipeline.stages.len(), 2);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse_pipeline(source: &str) -> Result<Pipeline> {
    let lua = create_sandbox().context("Failed to create definition sandbox")?;

    let table: Table = lua
        .load(source)
        .set_name("pipeline")
        .eval()
        .context("Failed to evaluate pipeline definition")?;

    let name: String = table
        .get("name")
        .context("Pipeline must have a 'name' field")?;

    let description: Option<String> = table
        .get("description")
        .context("Field 'description' must be a string")?;

    let stages = parse_stages(&table)?;

    let pipeline = Pipeline {
        name,
        description,
        stages,
    };

    pipeline
        .validate()
        .with_context(|| format!("Invalid pipeline definition '{}'", pipeline.name))?;

    Ok(pipeline)
}

fn parse_stages(pipeline: &Table) -> Result<Vec<Stage>> {
    let stages_table: Table = pipeline
        .get("stages")
        .context("Pipeline must have a 'stages' field")?;

    let mut stages = Vec::new();

    for pair in stages_table.sequence_values::<Table>() {
        let stage_table = pair.context("Failed to read stage entry")?;

        let name: String = stage_table
            .get("name")
            .context("Stage must have a 'name' field")?;

        let actions_table: Table = stage_table
            .get("actions")
            .with_context(|| format!("Stage '{}' must have an 'actions' field", name))?;

        let mut actions = Vec::new();
        for entry in actions_table.sequence_values::<Table>() {
            let action_table =
                entry.with_context(|| format!("Failed to read action entry in stage '{}'", name))?;
            actions.push(parse_action(&action_table).with_context(|| {
                format!("Invalid action in stage '{}'", name)
            })?);
        }

        stages.push(Stage { name, actions });
    }

    Ok(stages)
}

fn parse_action(table: &Table) -> Result<Action> {
    let name: String = table
        .get("name")
        .context("Action must have a 'name' field")?;

    let kind: String = table
        .get("kind")
        .with_context(|| format!("Action '{}' must have a 'kind' field", name))?;
    let kind: ActionKind = kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!("Action '{}': {}", name, e))?;

    let run_order: Option<u32> = table
        .get("run_order")
        .with_context(|| format!("Action '{}' run_order must be a non-negative integer", name))?;

    Ok(Action {
        namespace: optional_string(table, "namespace", &name)?,
        run_order: run_order.unwrap_or(DEFAULT_RUN_ORDER),
        command: optional_string(table, "command", &name)?,
        input: optional_string(table, "input", &name)?,
        outputs: string_list(table, "outputs", &name)?,
        variables: string_list(table, "variables", &name)?,
        env: parse_env(table, &name)?,
        capabilities: string_list(table, "capabilities", &name)?,
        rationale: optional_string(table, "rationale", &name)?,
        name,
        kind,
    })
}

fn optional_string(table: &Table, field: &str, action: &str) -> Result<Option<String>> {
    table
        .get(field)
        .with_context(|| format!("Action '{}' field '{}' must be a string", action, field))
}

fn string_list(table: &Table, field: &str, action: &str) -> Result<Vec<String>> {
    let value: Value = table.get(field).unwrap_or(Value::Nil);

    match value {
        Value::Nil => Ok(Vec::new()),
        Value::Table(list) => {
            let mut items = Vec::new();
            for item in list.sequence_values::<String>() {
                items.push(item.with_context(|| {
                    format!("Action '{}' field '{}' must contain strings", action, field)
                })?);
            }
            Ok(items)
        }
        _ => Err(anyhow::anyhow!(
            "Action '{}' field '{}' must be an array of strings",
            action,
            field
        )),
    }
}

/// Plain values become literals; `{ ref = "ns.var" }` tables become references
fn parse_env(table: &Table, action: &str) -> Result<BTreeMap<String, EnvValue>> {
    let value: Value = table.get("env").unwrap_or(Value::Nil);

    let env_table = match value {
        Value::Nil => return Ok(BTreeMap::new()),
        Value::Table(t) => t,
        _ => {
            return Err(anyhow::anyhow!(
                "Action '{}' field 'env' must be a table",
                action
            ));
        }
    };

    let mut env = BTreeMap::new();
    for pair in env_table.pairs::<String, Value>() {
        let (key, value) =
            pair.with_context(|| format!("Action '{}' has an invalid env entry", action))?;

        let env_value = match value {
            Value::String(s) => EnvValue::Literal(s.to_str()?.to_string()),
            Value::Integer(i) => EnvValue::Literal(i.to_string()),
            Value::Number(n) => EnvValue::Literal(n.to_string()),
            Value::Boolean(b) => EnvValue::Literal(b.to_string()),
            Value::Table(t) => {
                let reference: String = t.get("ref").with_context(|| {
                    format!("Action '{}' env '{}' table must have a 'ref' field", action, key)
                })?;
                EnvValue::Reference(reference.parse()?)
            }
            _ => {
                return Err(anyhow::anyhow!(
                    "Action '{}' env '{}' has an unsupported value type",
                    action,
                    key
                ));
            }
        };

        env.insert(key, env_value);
    }

    Ok(env)
}
