//! Repository implementations.
//!
//! Repositories provide data access methods for entities.

pub mod company;
pub mod company_request;
pub mod database_access;
pub mod database_assignment;
pub mod employee;
pub mod server_ip;
pub mod session;
pub mod sync_request;
pub mod tool;
pub mod user;

pub use company::{CompanyChanges, CompanyRepository};
pub use company_request::{
    ApprovalOutcome, CompanyRequestRepository, RequestFilter, SealedCredentials,
};
pub use database_access::{AccessFilter, DatabaseAccessRepository};
pub use database_assignment::{
    AssignmentChanges, AssignmentFilter, DatabaseAssignmentRepository, NewAssignment,
};
pub use employee::{EmployeeChanges, EmployeeFilter, EmployeeRepository, NewEmployee};
pub use server_ip::{ServerIpChanges, ServerIpRepository};
pub use session::SessionRepository;
pub use sync_request::{NewSyncRequest, SyncRequestRepository, SyncTransition};
pub use tool::{ToolChanges, ToolRepository};
pub use user::{AdminGuarded, NewUser, UserChanges, UserFilter, UserRepository};

use sqlx::PgExecutor;
use uuid::Uuid;

use crate::metrics::QueryTimer;

/// Builds an ILIKE pattern from a search term, escaping wildcards.
pub(crate) fn like_pattern(term: Option<&str>) -> Option<String> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{}%", escaped))
}

/// Flip `is_active` on a row; returns the new value or `None` if missing.
///
/// `table` is always a compile-time constant from a repository.
pub(crate) async fn toggle_active<'e, E: PgExecutor<'e>>(
    executor: E,
    table: &'static str,
    id: Uuid,
) -> Result<Option<bool>, sqlx::Error> {
    let timer = QueryTimer::new("toggle_is_active");
    let result = sqlx::query_scalar::<_, bool>(&format!(
        "UPDATE {} SET is_active = NOT is_active, updated_at = NOW() WHERE id = $1 RETURNING is_active",
        table
    ))
    .bind(id)
    .fetch_optional(executor)
    .await;
    timer.record();
    result
}

/// Hard delete by id. Foreign keys reject rows that still have dependants.
pub(crate) async fn delete_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    table: &'static str,
    id: Uuid,
) -> Result<bool, sqlx::Error> {
    let timer = QueryTimer::new("delete_by_id");
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", table))
        .bind(id)
        .execute(executor)
        .await;
    timer.record();
    Ok(result?.rows_affected() > 0)
}
