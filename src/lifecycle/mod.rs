//! Lifecycle module - Process guardian, fault events and server handle

pub mod event;
pub mod guardian;
pub mod server;

pub use event::{FaultEventKind, FaultReport, ProcessFaultEvent};
pub use guardian::{
    GuardianConfig, GuardianState, ProcessExit, ProcessGuardian, Terminator,
};
pub use server::{ListeningServer, ServerHandle};
