//! Core data model: targets, build specs, and the error taxonomy.

pub mod error;
pub mod spec;
pub mod target;

pub use error::{BuildPhase, Error, Result};
pub use spec::{BuildSpec, LinkMode, OptionMap, OutputKind, ToolOverrides};
pub use target::{AppleSdk, Arch, Os, Target};
