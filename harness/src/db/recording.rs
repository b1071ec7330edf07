use super::{Database, Dialect, Op, Row, Statement};
use crate::error::DbError;

/// Wraps another [`Database`], remembering the [`Op`] of every statement that went through it.
#[derive(Debug)]
pub struct RecordingDatabase<D> {
    inner: D,
    ops: Vec<Op>,
}

impl<D: Database> RecordingDatabase<D> {
    pub fn new(inner: D) -> Self {
        Self { inner, ops: Vec::new() }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn count(&self, op: Op) -> usize {
        self.ops.iter().filter(|&&o| o == op).count()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl<D: Database> Database for RecordingDatabase<D> {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn execute(&mut self, statement: &Statement) -> Result<Vec<Row>, DbError> {
        self.ops.push(statement.op);
        self.inner.execute(statement)
    }
}
