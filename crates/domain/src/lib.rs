//! Domain layer for the attendance sync portal.
//!
//! This crate contains:
//! - Domain models (companies, tools, users, credentials, requests)
//! - The request status state machine
//! - Pure business rules shared by the API services

pub mod models;
pub mod services;
