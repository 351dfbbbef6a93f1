pub mod attribution;
mod cli;
pub mod db;
pub mod import;
pub mod resolver;
pub mod settings;
pub mod store;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;

pub use db::Database;
pub use resolver::{DetailsLoader, RelatedThreadStates, Resolution, Resolver};
pub use store::{InMemoryStore, ThreadStateStore};

/// `info` unless `filters` (the `RUST_LOG` syntax) says otherwise.
fn logger_builder(filters: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(log::LevelFilter::Info);
    if let Some(filters) = filters {
        builder.parse_filters(filters);
    }
    builder
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    let filters = std::env::var(env_logger::DEFAULT_FILTER_ENV).ok();
    logger_builder(filters.as_deref()).init();

    let cli = cli::Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("wakechain")
        .build()
        .context("failed to start async runtime")?;

    let output = runtime.block_on(cli::execute(cli))?;
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn logger_defaults_to_info() {
        assert_eq!(logger_builder(None).build().filter(), LevelFilter::Info);
    }

    #[test]
    fn rust_log_filters_override_default() {
        assert_eq!(logger_builder(Some("debug")).build().filter(), LevelFilter::Debug);
        assert_eq!(logger_builder(Some("warn")).build().filter(), LevelFilter::Warn);
    }
}
