use std::time::{Duration, Instant};

use log::info;

use crate::{
    config::HarnessConfig,
    db::{Connector, Database},
    error::{HarnessError, Result},
    provision,
    strategy::{ResetStrategy, StrategyRegistry},
    table::TableSet,
};

/// The timing of one strategy over every measured repetition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub label: String,
    /// One entry per measured invocation, warm-up excluded.
    pub samples: Vec<Duration>,
}

impl Measurement {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            samples: Vec::new(),
        }
    }

    pub fn runs(&self) -> usize {
        self.samples.len()
    }

    pub fn total(&self) -> Duration {
        self.samples.iter().sum()
    }

    pub fn mean(&self) -> Duration {
        match u32::try_from(self.samples.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.total() / n,
        }
    }

    pub fn min(&self) -> Duration {
        self.samples.iter().copied().min().unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().copied().max().unwrap_or_default()
    }
}

/// Drives the benchmark: provisions the tables, then times each strategy against them.
#[derive(Debug)]
pub struct Runner<C> {
    config: HarnessConfig,
    connector: C,
    tables: Option<TableSet>,
}

impl<C: Connector> Runner<C> {
    pub fn new(config: HarnessConfig, connector: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connector,
            tables: None,
        })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn tables(&self) -> Option<&TableSet> {
        self.tables.as_ref()
    }

    pub fn connector(&mut self) -> &mut C {
        &mut self.connector
    }

    /// Creates the tables, replacing any left over from an earlier run.
    pub fn provision(&mut self) -> Result<&TableSet> {
        let (prefix, count) = (self.config.table_prefix.as_str(), self.config.table_count);
        let tables = self.connector.with_connection(|db| provision::create(db, prefix, count))?;
        info!("provisioned {} tables", tables.len());
        Ok(self.tables.insert(tables))
    }

    /// Drops the tables created by [`provision`][Self::provision], if any.
    pub fn teardown(&mut self) -> Result<()> {
        if let Some(tables) = self.tables.take() {
            self.connector.with_connection(|db| provision::drop_all(db, &tables))?;
        }
        Ok(())
    }

    fn ensure_provisioned(&mut self) -> Result<TableSet> {
        match &self.tables {
            Some(tables) => Ok(tables.clone()),
            None => self.provision().cloned(),
        }
    }

    /// Times `strategy` over the configured number of repetitions.
    ///
    /// Tables are refilled before every invocation, warm-up included, and the refill is never
    /// timed. Any failure aborts the run and no measurement is produced.
    pub fn benchmark(&mut self, strategy: &dyn ResetStrategy) -> Result<Measurement> {
        let tables = self.ensure_provisioned()?;
        let config = &self.config;
        info!("benchmarking {:?}", strategy.label());

        let measurement = self.connector.with_connection(|db| {
            for _ in 0..config.warmup {
                invoke(db, &tables, config.rows_per_table, strategy)?;
            }
            if !config.settle.is_zero() {
                std::thread::sleep(config.settle);
            }

            let mut measurement = Measurement::new(strategy.label());
            for _ in 0..config.repetitions {
                measurement.samples.push(invoke(db, &tables, config.rows_per_table, strategy)?);
            }
            Ok(measurement)
        })?;

        info!(
            "{:?} finished in {:?} over {} runs",
            measurement.label,
            measurement.total(),
            measurement.runs()
        );
        Ok(measurement)
    }

    /// Benchmarks every strategy of `registry` in order, stopping at the first failure.
    pub fn run_all(&mut self, registry: &StrategyRegistry) -> Result<Vec<Measurement>> {
        registry.iter().map(|s| self.benchmark(s)).collect()
    }
}

/// Refills the tables, then runs `strategy` once, returning how long the strategy alone took.
fn invoke(db: &mut dyn Database, tables: &TableSet, rows: usize, strategy: &dyn ResetStrategy) -> Result<Duration> {
    provision::fill(db, tables, rows)?;
    let start = Instant::now();
    strategy
        .reset(tables, db)
        .map_err(|source| HarnessError::StrategyExecution {
            strategy: strategy.label().to_owned(),
            source,
        })?;
    Ok(start.elapsed())
}
