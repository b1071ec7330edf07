//! A harness for comparing ways of emptying many identically shaped tables.
//!
//! [`provision`] creates and refills the tables, a [`StrategyRegistry`] holds the competing
//! [`ResetStrategy`]s, a [`Runner`] times each of them over a configured number of repetitions
//! and [`report`] prints the results. All database access goes through the [`db::Database`]
//! capability, implemented for MySQL and SQLite.

pub mod cleaner;
pub mod config;
pub mod db;
pub mod error;
pub mod provision;
pub mod report;
pub mod runner;
pub mod strategy;
pub mod table;

pub use cleaner::{Cleaner, TruncationCleaner};
pub use config::HarnessConfig;
pub use error::{DbError, HarnessError};
pub use report::report;
pub use runner::{Measurement, Runner};
pub use strategy::{ExternalClean, ResetStrategy, StrategyRegistry, Tactic};
pub use table::{TableName, TableSet};
