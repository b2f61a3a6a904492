//! Domain models for Groundwork.
//!
//! These are the core types shared across all crates.

pub mod job_site;
pub mod role;
pub mod service;
pub mod tenant;
pub mod user;
