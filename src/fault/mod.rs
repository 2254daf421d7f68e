//! Fault module - Taxonomy, classification and error responses

pub mod classifier;
pub mod responder;
pub mod taxonomy;

pub use classifier::{classify, FaultKind};
pub use responder::{CriticalAlert, ErrorResponder, LogAlert};
pub use taxonomy::{NormalizedError, RawFault, StatusClass};
