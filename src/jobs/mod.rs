//! Jobs module - Remote job handles, cancellation and the poller

pub mod cancel;
pub mod handle;
pub mod poller;

pub use cancel::{CancelHandle, Cancellation};
pub use handle::{JobHandle, JobState};
pub use poller::{JobPoller, PollConfig, PollError};
