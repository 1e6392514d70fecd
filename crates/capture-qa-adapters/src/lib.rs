//! Capture QA Adapters - External adapters for capture-qa.
//!
//! This crate provides the filesystem image source used by batch
//! front-ends.

pub mod fs;

pub use fs::FsImageSource;
