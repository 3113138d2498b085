//! Business services used by the route handlers.

pub mod access_requests;
pub mod admin_bootstrap;
pub mod auth;
pub mod cookies;
pub mod sync_requests;
pub mod workflow;

pub use access_requests::AccessRequestService;
pub use auth::AuthService;
pub use cookies::CookieHelper;
pub use sync_requests::SyncRequestService;
pub use workflow::{CredentialResolver, WorkflowError};
