//! Request handlers

pub mod luma;
pub mod runware;
pub mod system;
pub mod triggers;
