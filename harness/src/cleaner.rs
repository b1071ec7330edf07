use log::{trace, warn};

use crate::{db::Database, error::DbError, table::TableName};

/// An outside collaborator that knows how to empty every table by itself.
///
/// The harness treats it as opaque: it only cares that all tables are empty afterwards.
pub trait Cleaner {
    fn clean(&self, db: &mut dyn Database) -> Result<(), DbError>;
}

impl<F> Cleaner for F
where
    F: Fn(&mut dyn Database) -> Result<(), DbError>,
{
    fn clean(&self, db: &mut dyn Database) -> Result<(), DbError> {
        self(db)
    }
}

/// Truncates every table of the current schema, discovered through the catalog on each call.
///
/// Tables whose names cannot be used as a [`TableName`] are left alone with a warning.
#[derive(Debug, Clone, Default)]
pub struct TruncationCleaner {
    except: Vec<String>,
    pre_count: bool,
}

impl TruncationCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaves `table` alone.
    pub fn except(mut self, table: impl Into<String>) -> Self {
        self.except.push(table.into());
        self
    }

    /// Probes each table first and only truncates those holding rows.
    pub fn pre_count(mut self, pre_count: bool) -> Self {
        self.pre_count = pre_count;
        self
    }
}

impl Cleaner for TruncationCleaner {
    fn clean(&self, db: &mut dyn Database) -> Result<(), DbError> {
        for name in db.list_tables("")? {
            if self.except.contains(&name) {
                continue;
            }
            let table = match TableName::new(name.as_str()) {
                Ok(table) => table,
                Err(e) => {
                    warn!("not truncating {name:?}: {e}");
                    continue;
                }
            };
            if self.pre_count && !db.probe(&table)? {
                trace!("{table} is already empty");
                continue;
            }
            db.truncate(&table)?;
        }
        Ok(())
    }
}
