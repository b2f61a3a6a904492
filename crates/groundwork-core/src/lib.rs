//! Groundwork Core: domain models, error types and the repository
//! traits every storage backend implements.

pub mod error;
pub mod models;
pub mod repository;
