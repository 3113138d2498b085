//! Request extractors.

pub mod client_info;
pub mod current_user;
pub mod validated_json;

pub use client_info::ClientInfo;
pub use current_user::CurrentUser;
pub use validated_json::ValidatedJson;
