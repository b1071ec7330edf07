use std::time::Duration;

use crate::error::HarnessError;

/// Everything that shapes a benchmark run. Built once at startup and handed to the
/// [`Runner`][crate::runner::Runner].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Tables are named `<table_prefix>_1 ..= <table_prefix>_<table_count>`.
    pub table_prefix: String,
    pub table_count: usize,
    pub rows_per_table: usize,
    /// Untimed invocations before measuring starts.
    pub warmup: usize,
    /// Timed invocations per strategy.
    pub repetitions: usize,
    /// Pause between the warm-up and the measured invocations.
    pub settle: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            table_prefix: "table".to_owned(),
            table_count: 30,
            rows_per_table: 100,
            warmup: 10,
            repetitions: 10,
            settle: Duration::from_secs(1),
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), HarnessError> {
        if self.repetitions == 0 {
            return Err(HarnessError::InvalidConfig("at least one repetition is required".to_owned()));
        }
        if i64::try_from(self.rows_per_table).is_err() {
            return Err(HarnessError::InvalidConfig(format!(
                "{} rows per table is too many",
                self.rows_per_table
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = HarnessConfig::default();
        assert_eq!((c.table_count, c.rows_per_table, c.repetitions, c.warmup), (30, 100, 10, 10));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_repetitions() {
        let c = HarnessConfig {
            repetitions: 0,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(HarnessError::InvalidConfig(_))));
    }
}
