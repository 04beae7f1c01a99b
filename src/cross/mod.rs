//! Cross-compilation descriptor: static mapping tables, assembly, and
//! machine-file serialization.

pub mod descriptor;
pub mod maps;
pub mod serialize;

pub use descriptor::CrossDescriptor;
pub use maps::{apple_sdk_name, host_machine, target_triple, HostMachine};
