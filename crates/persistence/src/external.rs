//! Gateway to company SQL Server databases.
//!
//! Each company keeps its attendance data in its own SQL Server database.
//! Connections are opened per operation from an [`ExternalConnectionSpec`]
//! built out of the company's database assignment and decrypted password,
//! and closed when the operation finishes.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use domain::models::{ExternalSyncRow, NewExternalSyncRow, RequestStatus};
use thiserror::Error;
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use uuid::Uuid;

use crate::metrics::record_external_call;

/// Table written on dispatch, spelled as it exists in deployed databases.
pub const DEFAULT_SYNC_TABLE: &str = "dbo.AttandanceSynchronization";

/// Default connect timeout, the ADO.NET default.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Errors talking to a company database.
#[derive(Debug, Error)]
pub enum ExternalDbError {
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid connection settings: {0}")]
    InvalidConfig(String),
}

impl ExternalDbError {
    fn outcome(&self) -> &'static str {
        match self {
            ExternalDbError::Timeout(_) => "timeout",
            ExternalDbError::Connection(_) => "connection",
            ExternalDbError::Query(_) => "query",
            ExternalDbError::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// Driver-level options shared by every company connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub trust_server_certificate: bool,
    pub encrypt: bool,
    pub connect_timeout_secs: u64,
    pub query_timeout_secs: u64,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            trust_server_certificate: true,
            encrypt: false,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            query_timeout_secs: 30,
        }
    }
}

/// Everything needed to reach one company database.
#[derive(Clone)]
pub struct ExternalConnectionSpec {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub options: ConnectionOptions,
}

impl fmt::Debug for ExternalConnectionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalConnectionSpec")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("options", &self.options)
            .finish()
    }
}

impl ExternalConnectionSpec {
    /// Builds a spec, rejecting ports outside `1..=65535`.
    pub fn new(
        host: impl Into<String>,
        port: i32,
        database: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        options: ConnectionOptions,
    ) -> Result<Self, ExternalDbError> {
        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ExternalDbError::InvalidConfig(format!("invalid port {}", port)))?;
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ExternalDbError::InvalidConfig("empty host".to_string()));
        }
        Ok(Self {
            host,
            port,
            database: database.into(),
            username: username.into(),
            password: password.into(),
            options,
        })
    }

    /// Driver configuration. Values are passed as-is, so passwords never go
    /// through connection string quoting.
    pub fn to_driver_config(&self) -> Config {
        let mut config = Config::new();
        config.host(&self.host);
        config.port(self.port);
        config.database(&self.database);
        config.authentication(self.auth_method());
        if self.options.trust_server_certificate {
            config.trust_cert();
        }
        config.encryption(if self.options.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::Off
        });
        config
    }

    pub fn auth_method(&self) -> AuthMethod {
        AuthMethod::sql_server(&self.username, &self.password)
    }

    /// ADO.NET-style connection string, for export and display.
    pub fn to_ado_string(&self) -> String {
        self.render(&self.password)
    }

    /// Connection string with the password masked, for logs and errors.
    pub fn to_redacted_string(&self) -> String {
        self.render("********")
    }

    /// `host:port` for log fields.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn render(&self, password: &str) -> String {
        format!(
            "Server=tcp:{},{};Database={};User Id={};Password={};TrustServerCertificate={};Encrypt={};Connect Timeout={}",
            quote_value(&self.host),
            self.port,
            quote_value(&self.database),
            quote_value(&self.username),
            quote_value(password),
            self.options.trust_server_certificate,
            self.options.encrypt,
            self.options.connect_timeout_secs,
        )
    }
}

/// Quotes a connection string value when it contains delimiters, quotes,
/// braces or surrounding whitespace.
///
/// Values with `"` but no `'` are wrapped in single quotes; everything else
/// that needs quoting is wrapped in double quotes with inner `"` doubled.
pub fn quote_value(value: &str) -> String {
    let needs_quotes = value.contains(';')
        || value.contains('=')
        || value.contains('\'')
        || value.contains('"')
        || value.contains('{')
        || value.contains('}')
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);

    if !needs_quotes {
        return value.to_string();
    }
    if value.contains('"') && !value.contains('\'') {
        format!("'{}'", value)
    } else {
        format!("\"{}\"", value.replace('"', "\"\""))
    }
}

/// Validated, bracket-quoted name of the mirrored table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTableName(String);

impl SyncTableName {
    /// Accepts `table` or `schema.table`; each part must be a plain identifier.
    pub fn parse(raw: &str) -> Result<Self, ExternalDbError> {
        let parts: Vec<&str> = raw.trim().split('.').collect();
        if parts.is_empty() || parts.len() > 2 {
            return Err(ExternalDbError::InvalidConfig(format!(
                "invalid sync table name '{}'",
                raw
            )));
        }
        let mut quoted = Vec::with_capacity(parts.len());
        for part in parts {
            let mut chars = part.chars();
            let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(ExternalDbError::InvalidConfig(format!(
                    "invalid sync table name '{}'",
                    raw
                )));
            }
            quoted.push(format!("[{}]", part));
        }
        Ok(Self(quoted.join(".")))
    }

    pub fn as_sql(&self) -> &str {
        &self.0
    }
}

/// Operations the portal performs against company databases.
#[async_trait]
pub trait ExternalGateway: Send + Sync {
    /// Open a connection and run `SELECT 1`; returns the round-trip time.
    async fn ping(&self, spec: &ExternalConnectionSpec) -> Result<Duration, ExternalDbError>;

    /// Insert the mirrored row and return its identity.
    async fn insert_sync_row(
        &self,
        spec: &ExternalConnectionSpec,
        row: &NewExternalSyncRow,
    ) -> Result<i64, ExternalDbError>;

    async fn fetch_sync_row(
        &self,
        spec: &ExternalConnectionSpec,
        external_ref: i64,
    ) -> Result<Option<ExternalSyncRow>, ExternalDbError>;

    /// Returns false when the row no longer exists.
    async fn update_sync_status(
        &self,
        spec: &ExternalConnectionSpec,
        external_ref: i64,
        status: RequestStatus,
        remarks: Option<&str>,
    ) -> Result<bool, ExternalDbError>;
}

type SqlClient = Client<Compat<TcpStream>>;

/// [`ExternalGateway`] backed by tiberius.
#[derive(Debug, Clone)]
pub struct SqlServerGateway {
    table: SyncTableName,
}

impl SqlServerGateway {
    pub fn new(sync_table: &str) -> Result<Self, ExternalDbError> {
        Ok(Self {
            table: SyncTableName::parse(sync_table)?,
        })
    }

    async fn connect(spec: &ExternalConnectionSpec) -> Result<SqlClient, ExternalDbError> {
        let timeout_secs = spec.options.connect_timeout_secs;
        let config = spec.to_driver_config();

        let connect = async {
            let tcp = TcpStream::connect((spec.host.as_str(), spec.port))
                .await
                .map_err(|e| ExternalDbError::Connection(e.to_string()))?;
            tcp.set_nodelay(true)
                .map_err(|e| ExternalDbError::Connection(e.to_string()))?;
            Client::connect(config, tcp.compat_write())
                .await
                .map_err(|e| ExternalDbError::Connection(e.to_string()))
        };

        tokio::time::timeout(Duration::from_secs(timeout_secs), connect)
            .await
            .map_err(|_| ExternalDbError::Timeout(timeout_secs))?
    }

    /// Connects, runs `op`, closes, and records the outcome.
    async fn run<T, F>(
        &self,
        operation: &'static str,
        spec: &ExternalConnectionSpec,
        op: F,
    ) -> Result<T, ExternalDbError>
    where
        F: for<'c> FnOnce(
                &'c mut SqlClient,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = Result<T, ExternalDbError>> + Send + 'c>,
            > + Send,
        T: Send,
    {
        let started = Instant::now();
        let result: Result<T, ExternalDbError> = async {
            let mut client = Self::connect(spec).await?;
            let query_secs = spec.options.query_timeout_secs;
            let value = tokio::time::timeout(Duration::from_secs(query_secs), op(&mut client))
                .await
                .map_err(|_| ExternalDbError::Timeout(query_secs))??;
            if let Err(e) = client.close().await {
                tracing::debug!(error = %e, "Closing company database connection failed");
            }
            Ok(value)
        }
        .await;

        let elapsed = started.elapsed().as_secs_f64();
        match &result {
            Ok(_) => record_external_call(operation, "ok", elapsed),
            Err(e) => {
                record_external_call(operation, e.outcome(), elapsed);
                tracing::warn!(
                    operation,
                    target = %spec.target(),
                    database = %spec.database,
                    error = %e,
                    "Company database call failed"
                );
            }
        }
        result
    }
}

fn query_error(e: tiberius::error::Error) -> ExternalDbError {
    ExternalDbError::Query(e.to_string())
}

fn column<'a, T>(row: &'a Row, name: &str) -> Result<T, ExternalDbError>
where
    T: tiberius::FromSql<'a>,
{
    row.try_get::<T, _>(name)
        .map_err(query_error)?
        .ok_or_else(|| ExternalDbError::Query(format!("column {} is NULL", name)))
}

fn map_sync_row(row: &Row) -> Result<ExternalSyncRow, ExternalDbError> {
    Ok(ExternalSyncRow {
        id: column::<i64>(row, "Id")?,
        request_id: column::<Uuid>(row, "RequestId")?,
        tool_code: column::<&str>(row, "ToolCode")?.to_string(),
        from_date: column::<NaiveDate>(row, "FromDate")?,
        to_date: column::<NaiveDate>(row, "ToDate")?,
        status: column::<&str>(row, "Status")?.trim().to_string(),
        remarks: row
            .try_get::<&str, _>("Remarks")
            .map_err(query_error)?
            .map(str::to_string),
        created_date: column::<NaiveDateTime>(row, "CreatedDate")?,
        updated_date: row
            .try_get::<NaiveDateTime, _>("UpdatedDate")
            .map_err(query_error)?,
    })
}

#[async_trait]
impl ExternalGateway for SqlServerGateway {
    async fn ping(&self, spec: &ExternalConnectionSpec) -> Result<Duration, ExternalDbError> {
        let started = Instant::now();
        self.run("ping", spec, |client| {
            Box::pin(async move {
                client
                    .simple_query("SELECT 1")
                    .await
                    .map_err(query_error)?
                    .into_row()
                    .await
                    .map_err(query_error)?;
                Ok(())
            })
        })
        .await?;
        Ok(started.elapsed())
    }

    async fn insert_sync_row(
        &self,
        spec: &ExternalConnectionSpec,
        row: &NewExternalSyncRow,
    ) -> Result<i64, ExternalDbError> {
        let sql = format!(
            r#"
            INSERT INTO {} (RequestId, ToolCode, FromDate, ToDate, Status, Remarks, CreatedDate)
            OUTPUT INSERTED.Id
            VALUES (@P1, @P2, @P3, @P4, @P5, @P6, SYSDATETIME())
            "#,
            self.table.as_sql()
        );
        let row = row.clone();
        self.run("insert_sync_row", spec, move |client| {
            Box::pin(async move {
                let inserted = client
                    .query(
                        sql.as_str(),
                        &[
                            &row.request_id,
                            &row.tool_code.as_str(),
                            &row.from_date,
                            &row.to_date,
                            &row.status.code(),
                            &row.remarks.as_deref(),
                        ],
                    )
                    .await
                    .map_err(query_error)?
                    .into_row()
                    .await
                    .map_err(query_error)?
                    .ok_or_else(|| ExternalDbError::Query("insert returned no identity".into()))?;
                column::<i64>(&inserted, "Id")
            })
        })
        .await
    }

    async fn fetch_sync_row(
        &self,
        spec: &ExternalConnectionSpec,
        external_ref: i64,
    ) -> Result<Option<ExternalSyncRow>, ExternalDbError> {
        let sql = format!(
            r#"
            SELECT Id, RequestId, ToolCode, FromDate, ToDate, Status, Remarks, CreatedDate, UpdatedDate
            FROM {}
            WHERE Id = @P1
            "#,
            self.table.as_sql()
        );
        self.run("fetch_sync_row", spec, move |client| {
            Box::pin(async move {
                let row = client
                    .query(sql.as_str(), &[&external_ref])
                    .await
                    .map_err(query_error)?
                    .into_row()
                    .await
                    .map_err(query_error)?;
                row.as_ref().map(map_sync_row).transpose()
            })
        })
        .await
    }

    async fn update_sync_status(
        &self,
        spec: &ExternalConnectionSpec,
        external_ref: i64,
        status: RequestStatus,
        remarks: Option<&str>,
    ) -> Result<bool, ExternalDbError> {
        let sql = format!(
            r#"
            UPDATE {}
            SET Status = @P2, Remarks = COALESCE(@P3, Remarks), UpdatedDate = SYSDATETIME()
            WHERE Id = @P1
            "#,
            self.table.as_sql()
        );
        let remarks = remarks.map(str::to_string);
        self.run("update_sync_status", spec, move |client| {
            Box::pin(async move {
                let result = client
                    .execute(
                        sql.as_str(),
                        &[&external_ref, &status.code(), &remarks.as_deref()],
                    )
                    .await
                    .map_err(query_error)?;
                Ok(result.total() > 0)
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(password: &str) -> ExternalConnectionSpec {
        ExternalConnectionSpec::new(
            "10.0.0.15",
            1433,
            "HRM_Acme",
            "sync_user",
            password,
            ConnectionOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_ado_string_layout() {
        assert_eq!(
            spec("s3cret").to_ado_string(),
            "Server=tcp:10.0.0.15,1433;Database=HRM_Acme;User Id=sync_user;Password=s3cret;\
             TrustServerCertificate=true;Encrypt=false;Connect Timeout=30"
        );
    }

    #[test]
    fn test_password_with_delimiters_is_quoted() {
        let ado = spec("pa;ss=word").to_ado_string();
        assert!(ado.contains("Password=\"pa;ss=word\";"));
    }

    #[test]
    fn test_quote_value_rules() {
        assert_eq!(quote_value("plain"), "plain");
        assert_eq!(quote_value(" padded"), "\" padded\"");
        assert_eq!(quote_value("say \"hi\""), "'say \"hi\"'");
        assert_eq!(quote_value("it's \"x\""), "\"it's \"\"x\"\"\"");
        assert_eq!(quote_value("o'brien"), "\"o'brien\"");
        assert_eq!(quote_value("a{b}"), "\"a{b}\"");
    }

    #[test]
    fn test_driver_config_keeps_password_verbatim() {
        for password in ["a{b}", "}lead", "it's \"x\"", "semi;'both\"", " padded "] {
            let spec = spec(password);
            assert_eq!(
                spec.auth_method(),
                AuthMethod::sql_server("sync_user", password),
                "password {:?}",
                password
            );
        }
    }

    #[test]
    fn test_driver_config_address() {
        assert_eq!(spec("x").to_driver_config().get_addr(), "10.0.0.15:1433");
    }

    #[test]
    fn test_debug_and_redacted_string_hide_password() {
        let spec = spec("TopSecret!1");
        let debug = format!("{:?}", spec);
        assert!(!debug.contains("TopSecret!1"));
        assert!(debug.contains("[REDACTED]"));

        let redacted = spec.to_redacted_string();
        assert!(!redacted.contains("TopSecret!1"));
        assert!(redacted.contains("Password=********"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        for port in [0, -1, 70000] {
            let result = ExternalConnectionSpec::new(
                "db",
                port,
                "x",
                "y",
                "z",
                ConnectionOptions::default(),
            );
            assert!(matches!(result, Err(ExternalDbError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_sync_table_name() {
        assert_eq!(
            SyncTableName::parse(DEFAULT_SYNC_TABLE).unwrap().as_sql(),
            "[dbo].[AttandanceSynchronization]"
        );
        assert_eq!(SyncTableName::parse("Sync_1").unwrap().as_sql(), "[Sync_1]");
        assert!(SyncTableName::parse("dbo.x;DROP TABLE y").is_err());
        assert!(SyncTableName::parse("a.b.c").is_err());
        assert!(SyncTableName::parse("").is_err());
    }

    #[test]
    fn test_gateway_rejects_bad_table() {
        assert!(SqlServerGateway::new("bad name").is_err());
        assert!(SqlServerGateway::new(DEFAULT_SYNC_TABLE).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_server_times_out_or_fails() {
        let mut options = ConnectionOptions::default();
        options.connect_timeout_secs = 1;
        // TEST-NET-1 is never routed.
        let spec =
            ExternalConnectionSpec::new("192.0.2.1", 1433, "db", "u", "p", options).unwrap();
        let gateway = SqlServerGateway::new(DEFAULT_SYNC_TABLE).unwrap();
        let result = gateway.ping(&spec).await;
        assert!(matches!(
            result,
            Err(ExternalDbError::Timeout(1)) | Err(ExternalDbError::Connection(_))
        ));
    }
}
