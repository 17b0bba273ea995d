//! Database connection collaborator
//!
//! One [`Connection`] per connection name, built by [`ConnectionFactory`]
//! from `doctrine.connection.<name>`. SQLite is the only driver this build
//! provides.

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use keel_core::container::{service, Container, Factory, Service};
use keel_core::core_types::schema::OP_OPEN_CONNECTION;
use keel_core::{log_op_end, log_op_error, log_op_start};
use rusqlite::types::ValueRef;
use serde_json::Value;

use crate::db;
use crate::errors::{from_rusqlite, invalid_settings, not_configured, unsupported_driver, Result};
use crate::identifiers::CONNECTION;
use crate::provider::{connection_key, CONNECTION_KEY_PATTERN, DEFAULT_CONNECTION};
use crate::settings::{ConnectionParams, DoctrineSettings, SQLITE_DRIVERS};


/// Rows returned by a query, values rendered as JSON scalars
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Outcome of running one SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlOutcome {
    Rows(QueryResult),
    Affected(usize),
}

/// An open database connection shared through the container
#[derive(Debug)]
pub struct Connection {
    name: String,
    params: ConnectionParams,
    inner: Mutex<rusqlite::Connection>,
}

impl Connection {
    /// Open the connection described by `params`
    ///
    /// # Errors
    ///
    /// `ERR_UNSUPPORTED_DRIVER` for non-SQLite drivers, `ERR_INVALID_INPUT`
    /// for a malformed `url` or when SQLite params name neither a file nor
    /// memory, `ERR_PERSISTENCE` when SQLite refuses to open.
    pub fn open(name: &str, params: ConnectionParams) -> Result<Self> {
        let params = params.resolve_url(name)?;
        let driver = params.driver();
        if !SQLITE_DRIVERS.contains(&driver) {
            return Err(unsupported_driver("database driver", driver));
        }

        let conn = match (&params.path, params.memory) {
            (_, true) => {
                let conn = db::open_in_memory()?;
                db::configure(&conn, false)?;
                conn
            }
            (Some(path), false) => {
                let conn = db::open(path)?;
                db::configure(&conn, true)?;
                conn
            }
            (None, false) => {
                return Err(invalid_settings(
                    connection_key(name).as_str(),
                    "sqlite connections need `path` or `memory: true`",
                ))
            }
        };

        Ok(Self {
            name: name.to_string(),
            params,
            inner: Mutex::new(conn),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    fn lock(&self) -> MutexGuard<'_, rusqlite::Connection> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run several statements without returning rows
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.lock().execute_batch(sql).map_err(from_rusqlite)
    }

    /// Run one statement; queries return their rows, others the change count
    pub fn run(&self, sql: &str) -> Result<SqlOutcome> {
        let conn = self.lock();
        let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;

        if stmt.column_count() == 0 {
            let affected = stmt.execute([]).map_err(from_rusqlite)?;
            return Ok(SqlOutcome::Affected(affected));
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([]).map_err(from_rusqlite)?;
        while let Some(row) = cursor.next().map_err(from_rusqlite)? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(to_json(row.get_ref(idx).map_err(from_rusqlite)?));
            }
            rows.push(values);
        }

        Ok(SqlOutcome::Rows(QueryResult { columns, rows }))
    }

    /// Round-trip a trivial query
    pub fn ping(&self) -> Result<()> {
        self.lock()
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(from_rusqlite)
    }
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
    }
}

/// Builds `doctrine.connection.<name>`; the binding argument is the name
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionFactory;

impl ConnectionFactory {
    fn connection_name<'a>(service_key: &'a str, argument: Option<&'a str>) -> &'a str {
        let prefix = CONNECTION_KEY_PATTERN.trim_end_matches("%s");
        argument
            .or_else(|| service_key.strip_prefix(prefix).filter(|n| !n.is_empty()))
            .unwrap_or(DEFAULT_CONNECTION)
    }
}

impl Factory for ConnectionFactory {
    fn create(
        &self,
        container: &Container,
        service_key: &str,
        argument: Option<&str>,
    ) -> Result<Service> {
        let name = Self::connection_name(service_key, argument);
        let started = Instant::now();
        log_op_start!(OP_OPEN_CONNECTION, connection = name);

        let opened = DoctrineSettings::from_config(container.config()).and_then(|settings| {
            let params = settings.connection(name);
            if !params.is_configured() {
                return Err(not_configured(CONNECTION));
            }
            Connection::open(name, params)
        });

        match opened {
            Ok(connection) => {
                log_op_end!(
                    OP_OPEN_CONNECTION,
                    duration_ms = started.elapsed().as_millis() as u64,
                    connection = name,
                    driver = connection.params().driver()
                );
                Ok(service(connection))
            }
            Err(err) => {
                log_op_error!(
                    OP_OPEN_CONNECTION,
                    err,
                    duration_ms = started.elapsed().as_millis() as u64,
                    connection = name
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::errors::ExErrorKind;

    #[test]
    fn test_memory_connection_runs_statements() {
        let conn = Connection::open("t", ConnectionParams::sqlite_memory()).unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER, label TEXT)")
            .unwrap();

        assert_eq!(
            conn.run("INSERT INTO t VALUES (1, 'a'), (2, NULL)").unwrap(),
            SqlOutcome::Affected(2)
        );

        let SqlOutcome::Rows(result) = conn.run("SELECT id, label FROM t ORDER BY id").unwrap()
        else {
            panic!("expected rows");
        };
        assert_eq!(result.columns, vec!["id", "label"]);
        assert_eq!(
            result.rows,
            vec![
                vec![Value::from(1), Value::from("a")],
                vec![Value::from(2), Value::Null]
            ]
        );
        conn.ping().unwrap();
    }

    #[test]
    fn test_unsupported_driver() {
        let params = ConnectionParams {
            driver: Some("pdo_mysql".to_string()),
            host: Some("db".to_string()),
            ..ConnectionParams::default()
        };
        let err = Connection::open("orm_default", params).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::UnsupportedDriver);
    }

    #[test]
    fn test_sqlite_needs_location() {
        let params = ConnectionParams {
            driver: Some("sqlite".to_string()),
            ..ConnectionParams::default()
        };
        let err = Connection::open("orm_default", params).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::InvalidInput);
        assert_eq!(err.service_key(), Some("doctrine.connection.orm_default"));
    }

    #[test]
    fn test_url_opens_sqlite_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let db_path = dir.path().join("from-url.db");
        let params = ConnectionParams {
            url: Some(keel_core_types::Sensitive::new(format!(
                "sqlite:///{}",
                db_path.display()
            ))),
            ..ConnectionParams::default()
        };

        let conn = Connection::open("orm_default", params).unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER)").unwrap();
        assert_eq!(conn.params().path.as_deref(), Some(db_path.as_path()));
        assert!(db_path.exists());
    }

    #[test]
    fn test_connection_name_resolution() {
        assert_eq!(
            ConnectionFactory::connection_name("doctrine.connection.orm_default", Some("replica")),
            "replica"
        );
        assert_eq!(
            ConnectionFactory::connection_name("doctrine.connection.replica", None),
            "replica"
        );
        assert_eq!(
            ConnectionFactory::connection_name("custom.key", None),
            DEFAULT_CONNECTION
        );
    }
}
