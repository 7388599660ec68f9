//! Definition errors
//!
//! Raised while loading a pipeline definition. A pipeline that passes
//! validation can never produce one of these at runtime.

use thiserror::Error;

/// Errors detected when a pipeline definition is loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("pipeline name cannot be empty")]
    EmptyName,

    #[error("pipeline '{0}' has no stages")]
    EmptyPipeline(String),

    #[error("duplicate stage name '{0}'")]
    DuplicateStage(String),

    #[error("stage '{0}' has no actions")]
    EmptyStage(String),

    #[error("duplicate action '{action}' in stage '{stage}'")]
    DuplicateAction { stage: String, action: String },

    #[error("variable namespace '{0}' is declared by more than one action")]
    DuplicateNamespace(String),

    #[error("artifact '{0}' is produced by more than one action")]
    DuplicateArtifact(String),

    #[error("malformed variable reference '{0}' (expected <namespace>.<variable>)")]
    MalformedReference(String),

    /// The namespace does not exist or the producer does not declare the variable
    #[error("action '{action}' references unresolved variable '{reference}'")]
    UnresolvedReference { action: String, reference: String },

    #[error("action '{action}' references '{reference}' which is not produced earlier in the pipeline")]
    ReferenceNotEarlier { action: String, reference: String },

    #[error("action '{action}' consumes unknown artifact '{artifact}'")]
    UnknownArtifact { action: String, artifact: String },

    #[error("action '{action}' consumes artifact '{artifact}' which is not produced earlier in the pipeline")]
    ArtifactNotEarlier { action: String, artifact: String },
}
