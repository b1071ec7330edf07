//! The execution capability handed to provisioning and to every strategy.
//!
//! Nothing in the harness talks to a driver directly. Statements are built by a [`Dialect`] from
//! allow-listed [`TableName`]s and bound [`Value`]s, then run through a [`Database`], which is
//! obtained for the length of a scope from a [`Connector`].

use std::fmt::{Display, Formatter};

use crate::{
    error::{DbError, HarnessError},
    table::TableName,
};

pub mod mysql;
pub mod recording;
pub mod sqlite;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

impl Value {
    /// Integers are returned as text by some protocols, so text that parses is accepted too.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

pub type Row = Vec<Value>;

/// What a [`Statement`] does, independent of the SQL it is spelled with.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Op {
    /// `SELECT EXISTS(...)` row-existence check.
    Probe,
    /// Auto-increment counter lookup in the catalog.
    Counter,
    Truncate,
    Delete,
    Insert,
    Count,
    Create,
    Drop,
    /// Listing tables through the catalog.
    Catalog,
    /// Connection setup and server introspection.
    Session,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub op: Op,
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(op: Op, sql: impl Into<String>) -> Self {
        Self {
            op,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sql)?;
        if !self.params.is_empty() {
            write!(f, " {:?}", self.params)?;
        }
        Ok(())
    }
}

/// The SQL flavour spoken by a backend.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Dialect {
    MySql,
    Sqlite,
}

impl Dialect {
    pub fn create_table(self, table: &TableName) -> Statement {
        let t = table.quoted(self);
        let sql = match self {
            Self::MySql => {
                format!("CREATE TABLE {t} (id INT NOT NULL AUTO_INCREMENT PRIMARY KEY, name INT NULL) ENGINE=InnoDB")
            }
            Self::Sqlite => format!("CREATE TABLE {t} (id INTEGER PRIMARY KEY AUTOINCREMENT, name INTEGER NULL)"),
        };
        Statement::new(Op::Create, sql)
    }

    pub fn drop_table(self, table: &TableName) -> Statement {
        Statement::new(Op::Drop, format!("DROP TABLE IF EXISTS {}", table.quoted(self)))
    }

    /// Lists the tables of the current schema whose names start with `prefix`. The `LIKE` is only
    /// a pre-filter, callers check the exact naming pattern themselves.
    pub fn list_tables(self, prefix: &str) -> Statement {
        let sql = match self {
            Self::MySql => {
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE' AND table_name LIKE ? \
                 ORDER BY table_name"
            }
            Self::Sqlite => {
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' AND name LIKE ?1 ESCAPE '\\' \
                 ORDER BY name"
            }
        };
        Statement::new(Op::Catalog, sql).bind(format!("{}%", escape_like(prefix)).as_str())
    }

    /// Multi-row insert of `values` into the `name` column, one placeholder per row.
    pub fn insert_rows(self, table: &TableName, values: &[i64]) -> Statement {
        let placeholders = vec!["(?)"; values.len()].join(",");
        let sql = format!("INSERT INTO {} (name) VALUES {placeholders}", table.quoted(self));
        let mut statement = Statement::new(Op::Insert, sql);
        statement.params.extend(values.iter().copied().map(Value::Int));
        statement
    }

    pub fn count_rows(self, table: &TableName) -> Statement {
        Statement::new(Op::Count, format!("SELECT COUNT(*) FROM {}", table.quoted(self)))
    }

    pub fn probe(self, table: &TableName) -> Statement {
        Statement::new(
            Op::Probe,
            format!("SELECT EXISTS(SELECT 1 FROM {} LIMIT 1)", table.quoted(self)),
        )
    }

    /// Looks up the id the next insert into `table` will receive.
    pub fn next_auto_increment(self, table: &TableName) -> Statement {
        let sql = match self {
            Self::MySql => {
                "SELECT COALESCE(AUTO_INCREMENT, 1) FROM information_schema.tables \
                 WHERE table_schema = DATABASE() AND table_name = ?"
            }
            Self::Sqlite => "SELECT COALESCE((SELECT seq FROM sqlite_sequence WHERE name = ?1), 0) + 1",
        };
        Statement::new(Op::Counter, sql).bind(table.as_str())
    }

    /// Empties `table` and resets its auto-increment counter.
    ///
    /// SQLite has no `TRUNCATE`, so it is emulated with a full delete followed by dropping the
    /// table's `sqlite_sequence` entry.
    pub fn truncate(self, table: &TableName) -> Vec<Statement> {
        match self {
            Self::MySql => vec![Statement::new(Op::Truncate, format!("TRUNCATE TABLE {}", table.quoted(self)))],
            Self::Sqlite => vec![
                Statement::new(Op::Truncate, format!("DELETE FROM {}", table.quoted(self))),
                Statement::new(Op::Truncate, "DELETE FROM sqlite_sequence WHERE name = ?1").bind(table.as_str()),
            ],
        }
    }

    pub fn delete_all(self, table: &TableName) -> Statement {
        Statement::new(Op::Delete, format!("DELETE FROM {}", table.quoted(self)))
    }

    pub fn server_version(self) -> Statement {
        let sql = match self {
            Self::MySql => "SELECT VERSION()",
            Self::Sqlite => "SELECT sqlite_version()",
        };
        Statement::new(Op::Session, sql)
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::MySql => "MySQL",
            Self::Sqlite => "SQLite",
        })
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A single open connection able to run [`Statement`]s.
pub trait Database {
    fn dialect(&self) -> Dialect;

    /// Runs `statement`, returning every row it produced (none for anything but queries).
    fn execute(&mut self, statement: &Statement) -> Result<Vec<Row>, DbError>;

    /// Runs a query expected to return exactly one integer.
    fn query_i64(&mut self, statement: &Statement) -> Result<i64, DbError> {
        let rows = self.execute(statement)?;
        match rows.first().and_then(|r| r.first()).and_then(Value::as_i64) {
            Some(v) if rows.len() == 1 => Ok(v),
            _ => Err(DbError::UnexpectedResult {
                expected: "a single integer",
                sql: statement.sql.clone(),
            }),
        }
    }

    /// Whether `table` holds at least one row.
    fn probe(&mut self, table: &TableName) -> Result<bool, DbError> {
        let s = self.dialect().probe(table);
        Ok(self.query_i64(&s)? != 0)
    }

    /// The id the next insert into `table` would be assigned.
    fn next_auto_increment(&mut self, table: &TableName) -> Result<i64, DbError> {
        let s = self.dialect().next_auto_increment(table);
        self.query_i64(&s)
    }

    fn truncate(&mut self, table: &TableName) -> Result<(), DbError> {
        for s in self.dialect().truncate(table) {
            self.execute(&s)?;
        }
        Ok(())
    }

    fn delete_all(&mut self, table: &TableName) -> Result<(), DbError> {
        let s = self.dialect().delete_all(table);
        self.execute(&s)?;
        Ok(())
    }

    /// Names of all tables in the current schema starting with `prefix`.
    fn list_tables(&mut self, prefix: &str) -> Result<Vec<String>, DbError> {
        let s = self.dialect().list_tables(prefix);
        self.execute(&s)?
            .into_iter()
            .map(|row| match row.into_iter().next() {
                Some(Value::Text(name)) => Ok(name),
                _ => Err(DbError::UnexpectedResult {
                    expected: "a table name",
                    sql: s.sql.clone(),
                }),
            })
            .collect()
    }

    fn server_version(&mut self) -> Result<String, DbError> {
        let s = self.dialect().server_version();
        match self.execute(&s)?.into_iter().next().and_then(|r| r.into_iter().next()) {
            Some(Value::Text(v)) => Ok(v),
            _ => Err(DbError::UnexpectedResult {
                expected: "a version string",
                sql: s.sql,
            }),
        }
    }
}

impl<D: Database + ?Sized> Database for &mut D {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn execute(&mut self, statement: &Statement) -> Result<Vec<Row>, DbError> {
        (**self).execute(statement)
    }
}

/// Hands out a connection for the length of a scope, releasing it afterwards whether or not the
/// scope succeeded.
pub trait Connector {
    fn dialect(&self) -> Dialect;

    fn with_connection<T>(
        &mut self,
        scope: impl FnOnce(&mut dyn Database) -> Result<T, HarnessError>,
    ) -> Result<T, HarnessError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> TableName {
        TableName::new(name).unwrap()
    }

    #[test]
    fn mysql_statements() {
        let d = Dialect::MySql;
        assert_eq!(d.truncate(&t("table_1")), [Statement::new(Op::Truncate, "TRUNCATE TABLE `table_1`")]);
        assert_eq!(d.delete_all(&t("table_1")).sql, "DELETE FROM `table_1`");
        assert_eq!(d.probe(&t("table_2")).sql, "SELECT EXISTS(SELECT 1 FROM `table_2` LIMIT 1)");
        let counter = d.next_auto_increment(&t("table_3"));
        assert!(counter.sql.contains("information_schema.tables"));
        assert_eq!(counter.params, [Value::from("table_3")]);
    }

    #[test]
    fn sqlite_truncate_resets_sequence() {
        let s = Dialect::Sqlite.truncate(&t("table_1"));
        assert_eq!(s.len(), 2);
        assert!(s.iter().all(|s| s.op == Op::Truncate));
        assert_eq!(s[0].sql, "DELETE FROM \"table_1\"");
        assert_eq!(s[1].params, [Value::from("table_1")]);
    }

    #[test]
    fn insert_binds_every_row() {
        let s = Dialect::MySql.insert_rows(&t("table_1"), &[1, 2, 3]);
        assert_eq!(s.sql, "INSERT INTO `table_1` (name) VALUES (?),(?),(?)");
        assert_eq!(s.params, [Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn list_escapes_wildcards() {
        let s = Dialect::MySql.list_tables("my_tbl");
        assert_eq!(s.params, [Value::from("my\\_tbl%")]);
    }

    #[test]
    fn text_integers() {
        assert_eq!(Value::from("1").as_i64(), Some(1));
        assert_eq!(Value::from("x").as_i64(), None);
        assert_eq!(Value::Null.as_i64(), None);
    }
}
