//! Service Layer
//!
//! Business logic between the HTTP handlers and the engine.

pub mod run;

pub use run::RunRegistry;
