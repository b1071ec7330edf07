//! The ways of emptying a [`TableSet`] that are compared against each other.

use crate::{
    cleaner::Cleaner,
    db::Database,
    error::DbError,
    table::TableSet,
};

/// Something that, given the tables and a connection, leaves every table with zero rows.
///
/// Implementations must be stateless: the runner invokes them many times in a row, and some of
/// those invocations will find the tables already empty.
pub trait ResetStrategy {
    fn label(&self) -> &str;

    fn reset(&self, tables: &TableSet, db: &mut dyn Database) -> Result<(), DbError>;
}

/// The SQL-level strategies.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Tactic {
    /// Probe each table. Truncate it if it has rows, or if it is empty but its auto-increment
    /// counter has moved past 1. Every table ends up with its next id at 1.
    ProbeTruncateResetIds,
    /// Probe each table and truncate it only if it has rows. An empty table with a counter past 1
    /// is left alone.
    ProbeTruncate,
    /// Truncate every table.
    Truncate,
    /// `DELETE FROM` every table. Counters keep counting.
    Delete,
    /// Probe each table and delete from it only if it has rows.
    ProbeDelete,
}

impl Tactic {
    pub const ALL: [Self; 5] = [
        Self::ProbeTruncateResetIds,
        Self::ProbeTruncate,
        Self::Truncate,
        Self::Delete,
        Self::ProbeDelete,
    ];

    /// Whether the strategy guarantees every table's next id is 1 afterwards.
    pub fn resets_ids(self) -> bool {
        matches!(self, Self::ProbeTruncateResetIds | Self::Truncate)
    }
}

impl ResetStrategy for Tactic {
    fn label(&self) -> &str {
        match self {
            Self::ProbeTruncateResetIds => "Truncate non-empty tables (AUTO_INCREMENT ensured)",
            Self::ProbeTruncate => "Truncate non-empty tables (AUTO_INCREMENT is not ensured)",
            Self::Truncate => "Truncate all tables one by one",
            Self::Delete => "Delete all tables one by one",
            Self::ProbeDelete => "Delete non-empty tables one by one",
        }
    }

    fn reset(&self, tables: &TableSet, db: &mut dyn Database) -> Result<(), DbError> {
        for table in tables {
            match self {
                Self::ProbeTruncateResetIds => {
                    // Looking at the counter is cheaper than a TRUNCATE, which takes a metadata lock
                    if db.probe(table)? || db.next_auto_increment(table)? > 1 {
                        db.truncate(table)?;
                    }
                }
                Self::ProbeTruncate => {
                    if db.probe(table)? {
                        db.truncate(table)?;
                    }
                }
                Self::Truncate => db.truncate(table)?,
                Self::Delete => db.delete_all(table)?,
                Self::ProbeDelete => {
                    if db.probe(table)? {
                        db.delete_all(table)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Hands the whole job to an external [`Cleaner`], ignoring the table list.
#[derive(Debug)]
pub struct ExternalClean<C> {
    label: String,
    cleaner: C,
}

impl<C: Cleaner> ExternalClean<C> {
    pub fn new(label: impl Into<String>, cleaner: C) -> Self {
        Self {
            label: label.into(),
            cleaner,
        }
    }
}

impl<C: Cleaner> ResetStrategy for ExternalClean<C> {
    fn label(&self) -> &str {
        &self.label
    }

    fn reset(&self, _tables: &TableSet, db: &mut dyn Database) -> Result<(), DbError> {
        self.cleaner.clean(db)
    }
}

/// Strategies in the order they are benchmarked and reported.
#[derive(Default)]
pub struct StrategyRegistry {
    entries: Vec<Box<dyn ResetStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every [`Tactic`], followed by `cleaner`.
    pub fn standard<C: Cleaner + 'static>(cleaner: C) -> Self {
        let mut registry = Self::new();
        for tactic in Tactic::ALL {
            registry.register(tactic);
        }
        registry.register(ExternalClean::new("Truncate all tables with external cleaner", cleaner));
        registry
    }

    pub fn register(&mut self, strategy: impl ResetStrategy + 'static) -> &mut Self {
        self.entries.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &dyn ResetStrategy> {
        self.entries.iter().map(|s| s.as_ref())
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter().map(|s| s.label())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::TruncationCleaner;

    #[test]
    fn standard_order() {
        let registry = StrategyRegistry::standard(TruncationCleaner::new());
        let labels = registry.iter().map(|s| s.label()).collect::<Vec<_>>();
        assert_eq!(
            labels,
            [
                "Truncate non-empty tables (AUTO_INCREMENT ensured)",
                "Truncate non-empty tables (AUTO_INCREMENT is not ensured)",
                "Truncate all tables one by one",
                "Delete all tables one by one",
                "Delete non-empty tables one by one",
                "Truncate all tables with external cleaner",
            ]
        );
    }

    #[test]
    fn id_reset_guarantee() {
        let resetting = Tactic::ALL.into_iter().filter(|t| t.resets_ids()).collect::<Vec<_>>();
        assert_eq!(resetting, [Tactic::ProbeTruncateResetIds, Tactic::Truncate]);
    }
}
