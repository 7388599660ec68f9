//! Pipeline domain types
//!
//! A pipeline is an ordered sequence of stages, each an ordered set of actions.
//! Definitions are validated once at load time; the engine never sees an
//! invalid one.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::action::Action;
use crate::error::DefinitionError;

/// Pipeline definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stages: Vec<Stage>,
}

/// Ordered phase of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub actions: Vec<Action>,
}

/// Actions of a stage sharing one run-order; they execute concurrently
#[derive(Debug, Clone)]
pub struct RunOrderGroup<'a> {
    pub run_order: u32,
    pub actions: Vec<&'a Action>,
}

/// Position of an action in pipeline order: (stage index, run-order)
type Position = (usize, u32);

struct Producer<'a> {
    position: Position,
    variables: &'a [String],
}

impl Stage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Groups actions by run-order, ascending
    pub fn run_order_groups(&self) -> Vec<RunOrderGroup<'_>> {
        let mut groups: BTreeMap<u32, Vec<&Action>> = BTreeMap::new();
        for action in &self.actions {
            groups.entry(action.run_order).or_default().push(action);
        }

        groups
            .into_iter()
            .map(|(run_order, actions)| RunOrderGroup { run_order, actions })
            .collect()
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            stages: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn action_count(&self) -> usize {
        self.stages.iter().map(|s| s.actions.len()).sum()
    }

    /// Validates the definition
    ///
    /// Checks structural invariants (unique stage names, non-empty stages,
    /// unique namespaces and artifacts) and that every variable reference and
    /// input artifact is produced by an action earlier in pipeline order.
    /// "Earlier" means a previous stage, or the same stage with a lower run-order.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }

        if self.stages.is_empty() {
            return Err(DefinitionError::EmptyPipeline(self.name.clone()));
        }

        let mut stage_names = HashSet::new();
        let mut producers: HashMap<&str, Producer<'_>> = HashMap::new();
        let mut artifacts: HashMap<&str, Position> = HashMap::new();

        for (idx, stage) in self.stages.iter().enumerate() {
            if !stage_names.insert(stage.name.as_str()) {
                return Err(DefinitionError::DuplicateStage(stage.name.clone()));
            }

            if stage.actions.is_empty() {
                return Err(DefinitionError::EmptyStage(stage.name.clone()));
            }

            let mut action_names = HashSet::new();
            for action in &stage.actions {
                if !action_names.insert(action.name.as_str()) {
                    return Err(DefinitionError::DuplicateAction {
                        stage: stage.name.clone(),
                        action: action.name.clone(),
                    });
                }

                let position = (idx, action.run_order);
                let producer = Producer {
                    position,
                    variables: &action.variables,
                };
                if producers.insert(action.namespace(), producer).is_some() {
                    return Err(DefinitionError::DuplicateNamespace(
                        action.namespace().to_string(),
                    ));
                }

                for output in &action.outputs {
                    if artifacts.insert(output.as_str(), position).is_some() {
                        return Err(DefinitionError::DuplicateArtifact(output.clone()));
                    }
                }
            }
        }

        for (idx, stage) in self.stages.iter().enumerate() {
            for action in &stage.actions {
                let position = (idx, action.run_order);

                for reference in action.references() {
                    let producer = producers
                        .get(reference.namespace.as_str())
                        .filter(|p| p.variables.contains(&reference.name))
                        .ok_or_else(|| DefinitionError::UnresolvedReference {
                            action: action.name.clone(),
                            reference: reference.to_string(),
                        })?;

                    if !precedes(producer.position, position) {
                        return Err(DefinitionError::ReferenceNotEarlier {
                            action: action.name.clone(),
                            reference: reference.to_string(),
                        });
                    }
                }

                if let Some(input) = &action.input {
                    let produced_at = artifacts.get(input.as_str()).ok_or_else(|| {
                        DefinitionError::UnknownArtifact {
                            action: action.name.clone(),
                            artifact: input.clone(),
                        }
                    })?;

                    if !precedes(*produced_at, position) {
                        return Err(DefinitionError::ArtifactNotEarlier {
                            action: action.name.clone(),
                            artifact: input.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

fn precedes(producer: Position, consumer: Position) -> bool {
    producer.0 < consumer.0 || (producer.0 == consumer.0 && producer.1 < consumer.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action::{ActionKind, EnvValue};

    fn source() -> Action {
        Action::new("Source", ActionKind::Source)
            .with_namespace("SourceVariables")
            .with_variable("BranchName")
            .with_output("source")
    }

    fn build() -> Action {
        Action::new("Build", ActionKind::Build)
            .with_namespace("BuildVariables")
            .with_input("source")
            .with_variable("ARTIFACTS_PATH")
            .with_env(
                "GIT_BRANCH",
                EnvValue::reference("SourceVariables", "BranchName"),
            )
    }

    fn valid_pipeline() -> Pipeline {
        Pipeline::new("app")
            .with_stage(Stage::new("Source").with_action(source()))
            .with_stage(Stage::new("Build").with_action(build()))
    }

    #[test]
    fn test_valid_pipeline() {
        assert!(valid_pipeline().validate().is_ok());
        assert_eq!(valid_pipeline().action_count(), 2);
    }

    #[test]
    fn test_empty_pipeline() {
        let result = Pipeline::new("empty").validate();
        assert_eq!(result, Err(DefinitionError::EmptyPipeline("empty".into())));
    }

    #[test]
    fn test_duplicate_stage_name() {
        let pipeline = valid_pipeline().with_stage(
            Stage::new("Build").with_action(Action::new("Other", ActionKind::Test)),
        );
        assert_eq!(
            pipeline.validate(),
            Err(DefinitionError::DuplicateStage("Build".into()))
        );
    }

    #[test]
    fn test_empty_stage() {
        let pipeline = valid_pipeline().with_stage(Stage::new("Nothing"));
        assert_eq!(
            pipeline.validate(),
            Err(DefinitionError::EmptyStage("Nothing".into()))
        );
    }

    #[test]
    fn test_duplicate_namespace() {
        let pipeline = valid_pipeline().with_stage(
            Stage::new("Test")
                .with_action(Action::new("Test", ActionKind::Test).with_namespace("BuildVariables")),
        );
        assert_eq!(
            pipeline.validate(),
            Err(DefinitionError::DuplicateNamespace("BuildVariables".into()))
        );
    }

    #[test]
    fn test_reference_to_unknown_namespace() {
        let pipeline = valid_pipeline().with_stage(Stage::new("Deploy").with_action(
            Action::new("Deploy", ActionKind::Deploy)
                .with_env("PATH", EnvValue::reference("Nope", "ARTIFACTS_PATH")),
        ));
        assert!(matches!(
            pipeline.validate(),
            Err(DefinitionError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_reference_to_undeclared_variable() {
        let pipeline = valid_pipeline().with_stage(Stage::new("Deploy").with_action(
            Action::new("Deploy", ActionKind::Deploy)
                .with_env("X", EnvValue::reference("BuildVariables", "UNDECLARED")),
        ));
        assert!(matches!(
            pipeline.validate(),
            Err(DefinitionError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_reference_to_later_action() {
        let pipeline = Pipeline::new("backwards")
            .with_stage(Stage::new("Build").with_action(
                Action::new("Build", ActionKind::Build)
                    .with_env("BRANCH", EnvValue::reference("SourceVariables", "BranchName")),
            ))
            .with_stage(Stage::new("Source").with_action(source()));

        assert!(matches!(
            pipeline.validate(),
            Err(DefinitionError::ReferenceNotEarlier { .. })
        ));
    }

    #[test]
    fn test_reference_within_same_run_order_is_not_earlier() {
        let pipeline = Pipeline::new("same-wave").with_stage(
            Stage::new("Only")
                .with_action(source())
                .with_action(Action::new("Peer", ActionKind::Build).with_env(
                    "BRANCH",
                    EnvValue::reference("SourceVariables", "BranchName"),
                )),
        );

        assert!(matches!(
            pipeline.validate(),
            Err(DefinitionError::ReferenceNotEarlier { .. })
        ));
    }

    #[test]
    fn test_reference_to_lower_run_order_in_same_stage() {
        let pipeline = Pipeline::new("waves").with_stage(
            Stage::new("Only").with_action(source()).with_action(
                Action::new("Next", ActionKind::Build)
                    .with_run_order(2)
                    .with_input("source")
                    .with_env("BRANCH", EnvValue::reference("SourceVariables", "BranchName")),
            ),
        );

        assert!(pipeline.validate().is_ok());
    }

    #[test]
    fn test_unknown_input_artifact() {
        let pipeline = Pipeline::new("missing").with_stage(
            Stage::new("Build")
                .with_action(Action::new("Build", ActionKind::Build).with_input("source")),
        );
        assert!(matches!(
            pipeline.validate(),
            Err(DefinitionError::UnknownArtifact { .. })
        ));
    }

    #[test]
    fn test_duplicate_artifact() {
        let pipeline = valid_pipeline().with_stage(
            Stage::new("Again")
                .with_action(Action::new("Again", ActionKind::Source).with_output("source")),
        );
        assert_eq!(
            pipeline.validate(),
            Err(DefinitionError::DuplicateArtifact("source".into()))
        );
    }

    #[test]
    fn test_run_order_groups() {
        let stage = Stage::new("Deploy-to-Production")
            .with_action(Action::new("Deploy", ActionKind::Deploy).with_run_order(2))
            .with_action(Action::new("Review", ActionKind::Approval))
            .with_action(Action::new("Notify", ActionKind::Test));

        let groups = stage.run_order_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].run_order, 1);
        assert_eq!(groups[0].actions.len(), 2);
        assert_eq!(groups[1].run_order, 2);
        assert_eq!(groups[1].actions[0].name, "Deploy");
    }
}
