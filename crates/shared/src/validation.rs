//! Common validation utilities.
//!
//! Each function has the `validator` custom-function shape so request DTOs
//! can reference it with `#[validate(custom(function = "..."))]`.

use std::borrow::Cow;
use std::net::IpAddr;

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Company, tool and employee codes.
    static ref CODE_REGEX: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{1,19}$").unwrap();

    /// SQL Server database names and logins accepted by the portal.
    static ref SQL_IDENTIFIER_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_@$#.-]{0,127}$").unwrap();

    /// RFC 1123 host names.
    static ref HOSTNAME_REGEX: Regex = Regex::new(
        r"^(?i)[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*$"
    )
    .unwrap();
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

/// Rejects values that are empty or whitespace only.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "Value must not be blank"))
    } else {
        Ok(())
    }
}

/// Validates a short business code: 2-20 characters, letters, digits, `_` or `-`.
pub fn validate_code(value: &str) -> Result<(), ValidationError> {
    if CODE_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(error(
            "code_format",
            "Code must be 2-20 letters, digits, '_' or '-'",
        ))
    }
}

/// Validates a server address: an IPv4/IPv6 literal or a host name.
pub fn validate_server_address(value: &str) -> Result<(), ValidationError> {
    if value.parse::<IpAddr>().is_ok() {
        return Ok(());
    }
    if value.len() <= 253 && HOSTNAME_REGEX.is_match(value) {
        return Ok(());
    }
    Err(error(
        "server_address",
        "Server address must be an IP address or host name",
    ))
}

/// Validates an external database name or login.
pub fn validate_sql_identifier(value: &str) -> Result<(), ValidationError> {
    if SQL_IDENTIFIER_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(error(
            "sql_identifier",
            "Must start with a letter or '_' and contain only letters, digits or _@$#.-",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Acme").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   \t").is_err());
    }

    #[test]
    fn test_validate_not_blank_message() {
        let err = validate_not_blank(" ").unwrap_err();
        assert_eq!(err.message.unwrap().to_string(), "Value must not be blank");
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("ACME").is_ok());
        assert!(validate_code("hr_sync-01").is_ok());
        assert!(validate_code("A").is_err());
        assert!(validate_code("-ACME").is_err());
        assert!(validate_code("AC ME").is_err());
        assert!(validate_code(&"X".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_server_address() {
        assert!(validate_server_address("10.0.0.15").is_ok());
        assert!(validate_server_address("::1").is_ok());
        assert!(validate_server_address("sql01.corp.local").is_ok());
        assert!(validate_server_address("").is_err());
        assert!(validate_server_address("bad host").is_err());
        assert!(validate_server_address("host;drop").is_err());
    }

    #[test]
    fn test_validate_sql_identifier() {
        assert!(validate_sql_identifier("HRM_Attendance").is_ok());
        assert!(validate_sql_identifier("sync_user").is_ok());
        assert!(validate_sql_identifier("1database").is_err());
        assert!(validate_sql_identifier("db;DROP").is_err());
        assert!(validate_sql_identifier("").is_err());
    }
}
