//! OS-facing collaborators: process enumeration and per-process counter reads.

pub mod collector;
pub mod platform;

pub use collector::Collector;
