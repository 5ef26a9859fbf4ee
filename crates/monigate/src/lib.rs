//! Top-level facade crate for monigate.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use monigate_core::*;
}

pub mod gateway {
    pub use monigate_gateway::*;
}
