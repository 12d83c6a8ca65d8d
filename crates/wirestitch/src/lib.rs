//! Top-level facade crate for wirestitch.
//!
//! Re-exports the wire grammars and the tracer library so users can depend on a single crate.

pub mod core {
    pub use wirestitch_core::*;
}

pub mod tracer {
    pub use wirestitch_tracer::*;
}
