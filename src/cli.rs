use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::{
    attribution::{attribute_wakees, attribute_waker, WakeeAttribution, WakerAttribution},
    db::{models::describe_state, Database, ThreadStateId},
    import::{import_trace, load_trace_file, ImportSummary},
    resolver::{Resolution, Resolver},
    settings::SettingsStore,
};

#[derive(Debug, Parser)]
#[command(name = "wakechain", about = "Inspect scheduling relationships between thread states")]
pub struct Cli {
    /// SQLite database holding the trace.
    #[arg(long, env = "WAKECHAIN_DB", default_value = "trace.sqlite3")]
    pub db: PathBuf,

    /// JSON settings file. Missing files fall back to defaults.
    #[arg(long)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load processes, threads and thread states from a JSON trace.
    Import { trace: PathBuf },
    /// Print the previous/next states, waker and wakees of a thread state.
    Resolve { id: i64 },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveReport {
    #[serde(flatten)]
    pub resolution: Resolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub woken_by: Option<WakerAttribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub woken_threads: Option<WakeeAttribution>,
}

impl ResolveReport {
    pub fn new(resolution: Resolution) -> Self {
        let (state_description, woken_by, woken_threads) = match &resolution {
            Resolution::NotFound => (None, None, None),
            Resolution::Found { anchor, related } => (
                describe_state(&anchor.state),
                Some(attribute_waker(related)),
                attribute_wakees(anchor, related),
            ),
        };
        Self {
            resolution,
            state_description,
            woken_by,
            woken_threads,
        }
    }
}

pub async fn import(db: &Database, trace: PathBuf) -> Result<ImportSummary> {
    let document = load_trace_file(&trace)?;
    import_trace(db, &document).await
}

pub async fn resolve(db: Database, settings: &SettingsStore, id: i64) -> Result<ResolveReport> {
    let resolver = Resolver::new(Arc::new(db), settings.resolver());
    let resolution = resolver.resolve(ThreadStateId(id)).await?;
    Ok(ResolveReport::new(resolution))
}

pub async fn execute(cli: Cli) -> Result<String> {
    let settings = match &cli.settings {
        Some(path) => SettingsStore::new(path.clone())?,
        None => SettingsStore::new(PathBuf::from("wakechain.json"))?,
    };
    let db = Database::new(cli.db)?;

    let output = match cli.command {
        Command::Import { trace } => serde_json::to_string_pretty(&import(&db, trace).await?)?,
        Command::Resolve { id } => {
            serde_json::to_string_pretty(&resolve(db, &settings, id).await?)?
        }
    };
    Ok(output)
}
