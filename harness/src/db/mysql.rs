use log::{trace, warn};
use mysql::{prelude::Queryable, Opts, OptsBuilder, Pool, PooledConn};

use super::{Connector, Database, Dialect, Op, Row, Statement, Value};
use crate::error::{DbError, HarnessError};

fn to_mysql(value: &Value) -> mysql::Value {
    match value {
        Value::Null => mysql::Value::NULL,
        Value::Int(i) => mysql::Value::Int(*i),
        Value::Text(s) => mysql::Value::Bytes(s.as_bytes().to_vec()),
    }
}

fn from_mysql(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Int(i) => Value::Int(i),
        mysql::Value::UInt(u) => i64::try_from(u).map_or_else(|_| Value::Text(u.to_string()), Value::Int),
        mysql::Value::Bytes(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
        other => Value::Text(other.as_sql(true)),
    }
}

/// A pooled MySQL connection.
///
/// Statements without parameters go over the text protocol, since not every statement the harness
/// issues (`TRUNCATE`, DDL) is guaranteed to be preparable. Anything with parameters is prepared.
#[derive(Debug)]
pub struct MySqlDatabase<'c> {
    conn: &'c mut PooledConn,
}

impl<'c> MySqlDatabase<'c> {
    pub fn new(conn: &'c mut PooledConn) -> Self {
        Self { conn }
    }
}

impl Database for MySqlDatabase<'_> {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn execute(&mut self, statement: &Statement) -> Result<Vec<Row>, DbError> {
        trace!("{statement}");
        let rows = if statement.params.is_empty() {
            self.conn.query_iter(&statement.sql)?.collect::<Result<Vec<_>, _>>()?
        } else {
            let params = mysql::Params::Positional(statement.params.iter().map(to_mysql).collect());
            self.conn.exec_iter(&statement.sql, params)?.collect::<Result<Vec<_>, _>>()?
        };
        Ok(rows
            .into_iter()
            .map(|row| (0..row.len()).map(|i| row.as_ref(i).cloned().map_or(Value::Null, from_mysql)).collect())
            .collect())
    }
}

/// Connection parameters for a MySQL server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 3306,
            user: "root".to_owned(),
            password: String::new(),
            database: "truncate_vs_count".to_owned(),
        }
    }
}

impl From<MySqlConfig> for Opts {
    fn from(config: MySqlConfig) -> Self {
        OptsBuilder::new()
            .ip_or_hostname(Some(config.host))
            .tcp_port(config.port)
            .user(Some(config.user))
            .pass(Some(config.password))
            .db_name(Some(config.database))
            .into()
    }
}

#[derive(Debug)]
pub struct MySqlConnector {
    pool: Pool,
}

impl MySqlConnector {
    pub fn new(opts: impl Into<Opts>) -> Result<Self, HarnessError> {
        let opts: Opts = opts.into();
        let pool = Pool::new(opts).map_err(|e| HarnessError::Connection(e.into()))?;
        Ok(Self { pool })
    }

    pub fn from_url(url: &str) -> Result<Self, HarnessError> {
        let opts = Opts::from_url(url).map_err(|e| HarnessError::Connection(e.into()))?;
        Self::new(opts)
    }

    /// Makes `information_schema` report live `AUTO_INCREMENT` values instead of cached statistics.
    /// Servers older than 8.0 have no such cache, and reject the variable.
    fn prepare_session(db: &mut MySqlDatabase<'_>) {
        let s = Statement::new(Op::Session, "SET SESSION information_schema_stats_expiry = 0");
        if let Err(e) = db.execute(&s) {
            warn!("could not disable information_schema statistics caching: {e}");
        }
    }
}

impl Connector for MySqlConnector {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn with_connection<T>(
        &mut self,
        scope: impl FnOnce(&mut dyn Database) -> Result<T, HarnessError>,
    ) -> Result<T, HarnessError> {
        // Returned to the pool when dropped at the end of this function
        let mut conn = self.pool.get_conn().map_err(|e| HarnessError::Connection(e.into()))?;
        let mut db = MySqlDatabase::new(&mut conn);
        Self::prepare_session(&mut db);
        scope(&mut db)
    }
}
