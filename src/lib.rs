//! Crossdock - native toolchain resolution and Meson cross-build driving.
//!
//! This crate locates a platform-specific native toolchain on the build
//! host, synthesizes a Meson cross file for a target platform, and drives
//! `meson setup` / `meson compile` over a user-supplied project.

pub mod build;
pub mod core;
pub mod cross;
pub mod resolver;
pub mod util;

pub use build::{ArtifactRecord, BuildOrchestrator, BuildOutput};
pub use core::{
    AppleSdk, Arch, BuildSpec, Error, LinkMode, OptionMap, Os, OutputKind, Target, ToolOverrides,
};
pub use cross::CrossDescriptor;
pub use resolver::{ToolId, ToolInstance, ToolResolver};
