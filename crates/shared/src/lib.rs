//! Shared utilities and common types for the attendance sync portal.
//!
//! This crate provides common functionality used across all other crates:
//! - Credential encryption for stored database passwords
//! - Password hashing with Argon2id
//! - Session token signing and validation
//! - Offset pagination helpers
//! - Common validation logic

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
