//! Data Transfer Objects for inter-service communication
//!
//! This module contains DTOs used for communication between Gantry services
//! (orchestrator, CLI, deployment controller).

pub mod approval;
pub mod hook;
pub mod run;
