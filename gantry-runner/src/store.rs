//! Artifact and variable store
//!
//! One store exists per run. Each action publishes its outputs under its
//! namespace exactly once, after it succeeds; later actions read artifacts
//! by name and variables by `<namespace>.<name>`.

use gantry_core::domain::action::{EnvValue, VariableRef};
use gantry_core::domain::artifact::ArtifactHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("outputs for namespace '{0}' were already published")]
    AlreadyPublished(String),

    #[error("artifact '{0}' was already published")]
    DuplicateArtifact(String),

    #[error("artifact '{0}' has not been produced")]
    MissingArtifact(String),

    #[error("variable '{0}' has not been produced")]
    MissingVariable(VariableRef),
}

#[derive(Debug, Default)]
struct StoreInner {
    artifacts: HashMap<String, Arc<ArtifactHandle>>,
    variables: HashMap<String, HashMap<String, String>>,
}

/// Per-run store of artifact handles and output variables
#[derive(Debug, Default)]
pub struct RunStore {
    inner: RwLock<StoreInner>,
}

impl RunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the outputs of one action
    ///
    /// Either everything is published or nothing is. A namespace can be
    /// published only once per run.
    pub fn publish(
        &self,
        namespace: &str,
        artifacts: Vec<ArtifactHandle>,
        variables: HashMap<String, String>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if inner.variables.contains_key(namespace) {
            return Err(StoreError::AlreadyPublished(namespace.to_string()));
        }

        if let Some(existing) = artifacts
            .iter()
            .find(|a| inner.artifacts.contains_key(&a.name))
        {
            return Err(StoreError::DuplicateArtifact(existing.name.clone()));
        }

        for artifact in artifacts {
            inner.artifacts.insert(artifact.name.clone(), Arc::new(artifact));
        }
        inner.variables.insert(namespace.to_string(), variables);

        Ok(())
    }

    pub fn artifact(&self, name: &str) -> Result<Arc<ArtifactHandle>, StoreError> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .artifacts
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::MissingArtifact(name.to_string()))
    }

    pub fn variable(&self, reference: &VariableRef) -> Result<String, StoreError> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .variables
            .get(&reference.namespace)
            .and_then(|vars| vars.get(&reference.name))
            .cloned()
            .ok_or_else(|| StoreError::MissingVariable(reference.clone()))
    }

    /// Resolves an action's environment into concrete strings
    ///
    /// Fails on the first reference that has no published value.
    pub fn resolve_env(
        &self,
        env: &BTreeMap<String, EnvValue>,
    ) -> Result<HashMap<String, String>, StoreError> {
        env.iter()
            .map(|(key, value)| {
                let resolved = match value {
                    EnvValue::Literal(literal) => literal.clone(),
                    EnvValue::Reference(reference) => self.variable(reference)?,
                };
                Ok((key.clone(), resolved))
            })
            .collect()
    }

    pub fn is_published(&self, namespace: &str) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .variables
            .contains_key(namespace)
    }
}
