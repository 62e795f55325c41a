//! Utilities for testing concurrency primitives.
pub mod linearizability;
pub mod specifications;

pub use linearizability::history::{Action, History};
pub use linearizability::WGLChecker;

pub use specifications::Specification;
