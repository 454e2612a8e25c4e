//! # Dispatch
//!
//! Request dispatch and response normalization: actions run through the
//! executor against one store, or through the coordinator against both,
//! and always come back as a [`ResultEnvelope`].

pub mod context;
pub mod coordinator;
pub mod envelope;
pub mod errors;
pub mod executor;

pub use context::{AuthContext, RequestContext};
pub use coordinator::{Coordinator, DispatchMode, Dispatched, DualOutcome};
pub use envelope::{build, EnvelopeShape, Outcome, PageRef, Pagination, Payload, ResultEnvelope};
pub use errors::{ActionError, ActionResult};
pub use executor::{execute, Action};
