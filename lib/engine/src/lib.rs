//! # Cropwise Engine
//!
//! Owns the loaded training artifacts and serves predictions.
//!
//! The engine has two states. It starts [`EngineState::Uninitialized`] and
//! moves to [`EngineState::Ready`] exactly once, when the artifacts load
//! successfully. Loading is guarded so that concurrent first requests trigger
//! a single load; every other caller waits on it.

pub mod config;
pub mod engine;

pub use config::{ArtifactPaths, EngineConfig};
pub use engine::{ArtifactSource, Engine, EngineState, FileArtifacts, LoadedArtifacts};
