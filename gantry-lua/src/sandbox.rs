//! Lua sandbox creation
//!
//! Pipeline definitions are data, so the sandbox only offers basic Lua
//! (tables, strings, math, coroutines) plus the `pipeline` helper module.
//! There is no I/O, no process execution and no way to load external code.

use mlua::{Lua, LuaOptions, Result as LuaResult, StdLib, Table};

/// Action kinds exposed as `pipeline.<kind>{...}` helpers
const ACTION_HELPERS: &[(&str, &str)] = &[
    ("source", "Source"),
    ("build", "Build"),
    ("test", "Test"),
    ("deploy", "Deploy"),
    ("approval", "Approval"),
];

/// Create a restricted Lua sandbox for evaluating pipeline definitions
///
/// # Example
/// ```no_run
/// use gantry_lua::sandbox::create_sandbox;
///
/// let lua = create_sandbox()?;
/// let definition: mlua::Table = lua
///     .load(r#"return pipeline.define { name = "app", stages = {} }"#)
///     .eval()?;
/// let name: String = definition.get("name")?;
/// assert_eq!(name, "app");
/// # Ok::<(), mlua::Error>(())
/// ```
pub fn create_sandbox() -> LuaResult<Lua> {
    // Explicitly exclude: IO, OS, PACKAGE, DEBUG
    let lua = Lua::new_with(
        StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::COROUTINE,
        LuaOptions::default(),
    )?;

    lua.globals().set("require", mlua::Nil)?;
    lua.globals().set("dofile", mlua::Nil)?;
    lua.globals().set("loadfile", mlua::Nil)?;

    register_pipeline_module(&lua)?;

    Ok(lua)
}

/// Register the `pipeline` helper module
///
/// - `pipeline.define(t)` and `pipeline.stage(t)` return their table as-is
/// - `pipeline.source(t)`, `pipeline.build(t)`, ... set `t.kind` and return `t`
/// - `pipeline.var(namespace, name)` builds a variable reference env value
fn register_pipeline_module(lua: &Lua) -> LuaResult<()> {
    let pipeline = lua.create_table()?;

    let define_fn = lua.create_function(|_, definition: Table| Ok(definition))?;
    pipeline.set("define", define_fn)?;

    let stage_fn = lua.create_function(|_, stage: Table| Ok(stage))?;
    pipeline.set("stage", stage_fn)?;

    for (helper, kind) in ACTION_HELPERS {
        let kind = *kind;
        let action_fn = lua.create_function(move |_, action: Table| {
            action.set("kind", kind)?;
            Ok(action)
        })?;
        pipeline.set(*helper, action_fn)?;
    }

    let var_fn = lua.create_function(|lua, (namespace, name): (String, String)| {
        let reference = lua.create_table()?;
        reference.set("ref", format!("{}.{}", namespace, name))?;
        Ok(reference)
    })?;
    pipeline.set("var", var_fn)?;

    lua.globals().set("pipeline", pipeline)?;

    Ok(())
}
