//! Gantry Canary
//!
//! Pre-traffic validation for a freshly deployed candidate version.
//!
//! The hook writes a sentinel record through the candidate, waits for the
//! store to settle, reads the record back with a consistent read, removes
//! it, and reports the verdict to the deployment controller. Every
//! collaborator sits behind a trait so the same hook runs against HTTP
//! services or fully in-process.

pub mod config;
pub mod error;
pub mod hook;
pub mod invoker;
pub mod reporter;
pub mod store;
pub mod workload;

pub use config::{CanaryConfig, SentinelMode};
pub use error::{HookError, Result};
pub use hook::CanaryHook;
pub use invoker::{CandidateInvoker, HttpInvoker, LocalInvoker};
pub use reporter::{HttpLifecycleReporter, LifecycleReporter, LogReporter};
pub use store::{ConsistencyStore, HttpStore, InMemoryStore};
pub use workload::{Book, RecordBatch, StoredBook, put_book};
