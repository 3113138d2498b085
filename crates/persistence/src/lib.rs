//! Persistence layer for the attendance sync portal.
//!
//! This crate contains:
//! - Database connection management and embedded migrations
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - The gateway to company SQL Server databases

pub mod db;
pub mod entities;
pub mod external;
pub mod metrics;
pub mod repositories;
