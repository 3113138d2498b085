//! HTTP route handlers.

pub mod admin_companies;
pub mod admin_database_access;
pub mod admin_database_assignments;
pub mod admin_employees;
pub mod admin_requests;
pub mod admin_server_ips;
pub mod admin_sync_requests;
pub mod admin_tools;
pub mod admin_users;
pub mod auth;
pub mod company_requests;
pub mod health;
pub mod lookups;
pub mod sync_requests;
