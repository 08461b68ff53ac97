//! Modules layer - Infrastructure components behind the upload pipeline
//!
//! Key generation, local staging, external media tools and artifact storage.

pub mod keys;
pub mod media;
pub mod staging;
pub mod storage;
