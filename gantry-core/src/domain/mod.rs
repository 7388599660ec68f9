//! Core domain types
//!
//! This module contains the core domain structures used across Gantry services.
//! Pipeline definitions are immutable value graphs built once and handed to the
//! engine; run records, approvals and canary checks describe what happened to them.

pub mod action;
pub mod approval;
pub mod artifact;
pub mod canary;
pub mod pipeline;
pub mod run;
