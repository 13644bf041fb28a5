//! Core types and error definitions for the taxflow workspace.
//!
//! This crate provides the foundational types shared across all taxflow
//! crates: the task request unit, the uniform result envelope, the context
//! provider boundary, and error handling.
//!
//! # Main types
//!
//! - [`TaxflowError`]: Unified error enum for all taxflow subsystems.
//! - [`TaxflowResult`]: Convenience alias for `Result<T, TaxflowError>`.
//! - [`Task`]: A unit of work with a routing key and a free-form payload.
//! - [`Envelope`]: The success/error result shape every operation returns.
//! - [`ContextProvider`]: Boundary to the document retrieval backend.

/// Context provider boundary and retrieved items.
pub mod context;
/// Result envelopes.
pub mod envelope;
/// Error types.
pub mod error;
/// Task request units.
pub mod task;

pub use context::{ContextItem, ContextProvider, Metadata, Relevance};
pub use envelope::{Envelope, EnvelopeStatus};
pub use error::{TaxflowError, TaxflowResult};
pub use task::{Payload, Task};
