//! Loading traces from a JSON document into the database.
//!
//! ```json
//! {
//!   "processes": [{"upid": 1, "pid": 800, "name": "com.app"}],
//!   "threads": [{"utid": 2, "tid": 812, "name": "RenderThread", "upid": 1}],
//!   "threadStates": [{"id": 10, "ts": 0, "dur": 50, "utid": 2, "state": "S"}]
//! }
//! ```

use std::{collections::HashMap, fs, path::Path};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    db::{Database, ProcessInfo, ThreadInfo, ThreadState, Utid},
    log_info,
};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRecord {
    pub utid: Utid,
    pub tid: Option<i64>,
    pub name: Option<String>,
    pub upid: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraceDocument {
    pub processes: Vec<ProcessInfo>,
    pub threads: Vec<ThreadRecord>,
    pub thread_states: Vec<ThreadState>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub processes: usize,
    pub threads: usize,
    pub thread_states: usize,
    /// Thread states in the database once the import has committed.
    pub stored_thread_states: u64,
}

pub fn load_trace_file(path: &Path) -> Result<TraceDocument> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse trace {}", path.display()))
}

/// Links each thread to its process record.
fn resolve_threads(document: &TraceDocument) -> Result<Vec<ThreadInfo>> {
    let processes: HashMap<i64, &ProcessInfo> = document
        .processes
        .iter()
        .map(|process| (process.upid, process))
        .collect();

    document
        .threads
        .iter()
        .map(|record| {
            let process = record
                .upid
                .map(|upid| {
                    processes.get(&upid).map(|process| (*process).clone()).ok_or_else(|| {
                        anyhow!("thread {} references unknown process {upid}", record.utid)
                    })
                })
                .transpose()?;
            Ok(ThreadInfo {
                utid: record.utid,
                tid: record.tid,
                name: record.name.clone(),
                process,
            })
        })
        .collect()
}

pub async fn import_trace(db: &Database, document: &TraceDocument) -> Result<ImportSummary> {
    let threads = resolve_threads(document)?;

    db.insert_trace(&document.processes, &threads, &document.thread_states).await?;
    let stored_thread_states = db
        .count_thread_states()
        .await
        .context("failed to count imported thread states")?;

    let summary = ImportSummary {
        processes: document.processes.len(),
        threads: threads.len(),
        thread_states: document.thread_states.len(),
        stored_thread_states,
    };
    log_info!(
        "Imported {} processes, {} threads, {} thread states ({} stored)",
        summary.processes,
        summary.threads,
        summary.thread_states,
        summary.stored_thread_states
    );
    Ok(summary)
}
