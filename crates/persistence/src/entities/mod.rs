//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod company;
pub mod company_request;
pub mod database_access;
pub mod database_assignment;
pub mod employee;
pub mod server_ip;
pub mod sync_request;
pub mod tool;
pub mod user;

pub use company::CompanyEntity;
pub use company_request::{CompanyRequestEntity, CompanyRequestViewEntity};
pub use database_access::{DatabaseAccessEntity, DatabaseAccessViewEntity, MyAccessEntity};
pub use database_assignment::{DatabaseAssignmentEntity, DatabaseAssignmentViewEntity};
pub use employee::{EmployeeEntity, EmployeeViewEntity};
pub use server_ip::ServerIpEntity;
pub use sync_request::{SyncRequestEntity, SyncRequestViewEntity};
pub use tool::ToolEntity;
pub use user::{LoginSessionEntity, UserEntity};

use domain::models::RequestStatus;

/// Parses a stored status code.
///
/// The column carries a CHECK constraint, so an unknown code means the row
/// was written outside the portal; it is treated as rejected.
pub(crate) fn status_from_db(code: &str) -> RequestStatus {
    code.parse().unwrap_or_else(|_| {
        tracing::warn!(status = code, "Unknown request status in database");
        RequestStatus::Rejected
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_db() {
        assert_eq!(status_from_db("NR"), RequestStatus::New);
        assert_eq!(status_from_db("IP"), RequestStatus::InProgress);
        assert_eq!(status_from_db("??"), RequestStatus::Rejected);
    }
}
