use std::time::Duration;

use log::LevelFilter;
use reset_harness::{db::mysql::MySqlConfig, HarnessConfig, StrategyRegistry, TruncationCleaner};
use reset_bench::Target;

const TABLE_COUNT: usize = 30;
const ROWS_PER_TABLE: usize = 100;
const WARMUP: usize = 10;
const REPETITIONS: usize = 10;
const SETTLE: Duration = Duration::from_secs(1);

fn main() -> anyhow::Result<()> {
    simplelog::TermLogger::init(
        LevelFilter::Info,
        simplelog::ConfigBuilder::new().add_filter_allow_str("reset").build(),
        simplelog::TerminalMode::Stderr,
        Default::default(),
    )?;

    let target = match std::env::var("DATABASE_URL") {
        Ok(url) => Target::parse(&url)?,
        Err(_) => Target::MySql(MySqlConfig::default()),
    };
    let config = HarnessConfig {
        table_count: TABLE_COUNT,
        rows_per_table: ROWS_PER_TABLE,
        warmup: WARMUP,
        repetitions: REPETITIONS,
        settle: SETTLE,
        ..Default::default()
    };
    let registry = StrategyRegistry::standard(TruncationCleaner::new());

    let results = target.run(config, &registry)?;
    results.stdout()?;

    Ok(())
}
