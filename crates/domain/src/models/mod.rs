//! Domain models for the attendance sync portal.

pub mod attendance_sync;
pub mod common;
pub mod company;
pub mod company_request;
pub mod database_access;
pub mod database_assignment;
pub mod employee;
pub mod request_status;
pub mod server_ip;
pub mod sync_request;
pub mod tool;
pub mod user;

pub use attendance_sync::{ExternalSyncRow, NewExternalSyncRow};
pub use common::{ListQuery, LookupItem, ToggleStatusResponse};
pub use company::Company;
pub use company_request::CompanyRequest;
pub use database_access::DatabaseAccess;
pub use database_assignment::DatabaseAssignment;
pub use employee::Employee;
pub use request_status::{RequestStatus, TransitionError};
pub use server_ip::ServerIp;
pub use sync_request::SyncRequest;
pub use tool::Tool;
pub use user::{User, UserRole};
