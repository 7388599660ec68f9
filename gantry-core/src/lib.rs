//! Gantry Core
//!
//! Core types and abstractions for the Gantry delivery system.
//!
//! This crate contains:
//! - Domain types: Pipeline definitions, approvals, canary checks and run history
//! - Definition errors raised when a pipeline is loaded
//! - DTOs: Data transfer objects for inter-service communication

pub mod domain;
pub mod dto;
pub mod error;

pub use error::DefinitionError;
