//! Build orchestration: dependency scanning, environment derivation, and
//! the configure/compile state machine.

pub mod artifact;
pub mod deps;
pub mod env;
pub mod orchestrator;

pub use artifact::{ArtifactRecord, BuildOutput};
pub use orchestrator::BuildOrchestrator;
