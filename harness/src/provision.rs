//! Creating, filling and dropping the [`TableSet`] a benchmark runs on.

use log::debug;

use crate::{
    db::Database,
    error::{HarnessError, Result},
    table::{TableName, TableSet},
};

/// Upper bound on rows per `INSERT`, keeping well under every driver's placeholder limit.
pub const MAX_BATCH: usize = 10_000;

/// Drops every table following the `<prefix>_<n>` naming pattern, then creates `count` fresh ones.
pub fn create(db: &mut dyn Database, prefix: &str, count: usize) -> Result<TableSet> {
    let tables = TableSet::new(prefix, count).map_err(|e| HarnessError::schema(prefix, e))?;
    let dialect = db.dialect();

    let existing = db.list_tables(prefix).map_err(|e| HarnessError::schema(prefix, e))?;
    for name in existing.into_iter().filter(|n| tables.matches_pattern(n)) {
        let table = TableName::new(name.as_str()).map_err(|e| HarnessError::schema(&name, e))?;
        debug!("dropping stale table {table}");
        db.execute(&dialect.drop_table(&table)).map_err(|e| HarnessError::schema(&table, e))?;
    }

    for table in &tables {
        db.execute(&dialect.create_table(table)).map_err(|e| HarnessError::schema(table, e))?;
    }
    debug!("created {} tables", tables.len());
    Ok(tables)
}

/// Inserts `rows_per_table` rows into every table of `tables`.
///
/// Every table must be empty beforehand. A table that still holds rows means whatever ran before
/// failed to reset it, and is reported as [`HarnessError::NotEmpty`].
pub fn fill(db: &mut dyn Database, tables: &TableSet, rows_per_table: usize) -> Result<()> {
    if rows_per_table == 0 {
        return Ok(());
    }
    let last = i64::try_from(rows_per_table)
        .map_err(|_| HarnessError::InvalidConfig(format!("{rows_per_table} rows per table is too many")))?;
    let values = (1..=last).collect::<Vec<_>>();
    let dialect = db.dialect();

    for table in tables {
        if db.probe(table).map_err(|e| HarnessError::data(table, e))? {
            return Err(HarnessError::NotEmpty { table: table.clone() });
        }
        for chunk in values.chunks(MAX_BATCH) {
            db.execute(&dialect.insert_rows(table, chunk)).map_err(|e| HarnessError::data(table, e))?;
        }
    }
    Ok(())
}

pub fn drop_all(db: &mut dyn Database, tables: &TableSet) -> Result<()> {
    let dialect = db.dialect();
    for table in tables {
        db.execute(&dialect.drop_table(table)).map_err(|e| HarnessError::schema(table, e))?;
    }
    debug!("dropped {} tables", tables.len());
    Ok(())
}

pub fn row_count(db: &mut dyn Database, table: &TableName) -> Result<u64> {
    let s = db.dialect().count_rows(table);
    let n = db.query_i64(&s).map_err(|e| HarnessError::data(table, e))?;
    Ok(n.max(0) as u64)
}

/// The id the next row inserted into `table` would receive.
pub fn next_id(db: &mut dyn Database, table: &TableName) -> Result<i64> {
    db.next_auto_increment(table).map_err(|e| HarnessError::data(table, e))
}
