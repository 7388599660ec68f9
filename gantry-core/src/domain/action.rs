//! Action domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::DefinitionError;

/// Run-order assigned to actions that do not declare one
pub const DEFAULT_RUN_ORDER: u32 = 1;

fn default_run_order() -> u32 {
    DEFAULT_RUN_ORDER
}

/// Kind of work an action performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Source,
    Build,
    Test,
    Deploy,
    Approval,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Source => write!(f, "Source"),
            ActionKind::Build => write!(f, "Build"),
            ActionKind::Test => write!(f, "Test"),
            ActionKind::Deploy => write!(f, "Deploy"),
            ActionKind::Approval => write!(f, "Approval"),
        }
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "source" => Ok(ActionKind::Source),
            "build" => Ok(ActionKind::Build),
            "test" => Ok(ActionKind::Test),
            "deploy" => Ok(ActionKind::Deploy),
            "approval" => Ok(ActionKind::Approval),
            other => Err(format!("unknown action kind '{}'", other)),
        }
    }
}

/// Reference to another action's output variable, written `<namespace>.<variable>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VariableRef {
    pub namespace: String,
    pub name: String,
}

impl VariableRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl FromStr for VariableRef {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, name) = s
            .split_once('.')
            .ok_or_else(|| DefinitionError::MalformedReference(s.to_string()))?;

        let namespace = namespace.trim();
        let name = name.trim();
        if namespace.is_empty() || name.is_empty() {
            return Err(DefinitionError::MalformedReference(s.to_string()));
        }

        Ok(Self::new(namespace, name))
    }
}

impl TryFrom<String> for VariableRef {
    type Error = DefinitionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<VariableRef> for String {
    fn from(reference: VariableRef) -> Self {
        reference.to_string()
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Environment value handed to an action
///
/// Literals are passed through unchanged; references are substituted with the
/// value the producing action emitted, right before the action starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvValue {
    Literal(String),
    Reference(VariableRef),
}

impl EnvValue {
    pub fn literal(value: impl Into<String>) -> Self {
        EnvValue::Literal(value.into())
    }

    pub fn reference(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        EnvValue::Reference(VariableRef::new(namespace, name))
    }
}

/// Smallest schedulable unit of pipeline work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub kind: ActionKind,

    /// Namespace for output variables; the action name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default = "default_run_order")]
    pub run_order: u32,

    /// Command reference handed to the executor (e.g. a build spec path)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Artifact consumed by this action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,

    /// Artifacts this action produces
    #[serde(default)]
    pub outputs: Vec<String>,

    /// Output variables this action declares
    #[serde(default)]
    pub variables: Vec<String>,

    #[serde(default)]
    pub env: BTreeMap<String, EnvValue>,

    /// Capability grants requested from the execution environment (deploy roles)
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Reviewer-facing text for approval actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl Action {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            namespace: None,
            run_order: DEFAULT_RUN_ORDER,
            command: None,
            input: None,
            outputs: Vec::new(),
            variables: Vec::new(),
            env: BTreeMap::new(),
            capabilities: Vec::new(),
            rationale: None,
        }
    }

    /// Namespace that qualifies this action's output variables
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or(&self.name)
    }

    pub fn is_approval(&self) -> bool {
        self.kind == ActionKind::Approval
    }

    /// Iterates over the variable references in this action's environment
    pub fn references(&self) -> impl Iterator<Item = &VariableRef> {
        self.env.values().filter_map(|value| match value {
            EnvValue::Reference(reference) => Some(reference),
            EnvValue::Literal(_) => None,
        })
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_run_order(mut self, run_order: u32) -> Self {
        self.run_order = run_order;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_input(mut self, artifact: impl Into<String>) -> Self {
        self.input = Some(artifact.into());
        self
    }

    pub fn with_output(mut self, artifact: impl Into<String>) -> Self {
        self.outputs.push(artifact.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.variables.push(name.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: EnvValue) -> Self {
        self.env.insert(key.into(), value);
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}
