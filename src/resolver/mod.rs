//! Tool discovery: resolver strategies, the resolver chain, and compiler
//! toolchain selection.

pub mod chain;
pub mod compiler;
pub mod strategy;
pub mod tool;

pub use chain::ToolResolver;
pub use compiler::{resolve_toolchain, MsvcEnvScript, NdkToolchain, ResolvedToolchain};
pub use strategy::ResolverStrategy;
pub use tool::{ToolId, ToolInstance};
