//! SQL Server hosts that company databases live on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use shared::validation::validate_server_address;

/// Default SQL Server TCP port.
pub const DEFAULT_SQL_SERVER_PORT: i32 = 1433;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerIp {
    pub id: Uuid,
    pub ip_address: String,
    pub port: i32,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateServerIpRequest {
    #[validate(custom(function = "validate_server_address"))]
    pub ip_address: String,
    #[serde(default = "default_port")]
    #[validate(range(min = 1, max = 65535, message = "Port must be 1-65535"))]
    pub port: i32,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_port() -> i32 {
    DEFAULT_SQL_SERVER_PORT
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateServerIpRequest {
    #[validate(custom(function = "validate_server_address"))]
    pub ip_address: Option<String>,
    #[validate(range(min = 1, max = 65535, message = "Port must be 1-65535"))]
    pub port: Option<i32>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}
