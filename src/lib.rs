//! Wheelwright - Reproducible Build-Environment Provisioner
//!
//! Assembles a working toolchain for a Python scientific package that
//! depends on a large pinned simulation engine, with content-addressed
//! wheel caching and gated analysis/test stages.

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod toolchain;

pub use error::{WheelwrightError, WheelwrightResult};
