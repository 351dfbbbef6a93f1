use anyhow::{Context, Result};
use rusqlite::{params, Transaction};

use crate::db::{
    models::{ProcessInfo, ThreadInfo},
    Database,
};

pub(crate) fn insert_process_rows(tx: &Transaction, processes: &[ProcessInfo]) -> Result<()> {
    for process in processes {
        tx.execute(
            "INSERT INTO process (upid, pid, name) VALUES (?1, ?2, ?3)",
            params![process.upid, process.pid, process.name],
        )
        .with_context(|| format!("failed to insert process {}", process.upid))?;
    }
    Ok(())
}

/// A thread's `process`, when set, must already exist.
pub(crate) fn insert_thread_rows(tx: &Transaction, threads: &[ThreadInfo]) -> Result<()> {
    for thread in threads {
        tx.execute(
            "INSERT INTO thread (utid, tid, name, upid) VALUES (?1, ?2, ?3, ?4)",
            params![
                thread.utid.0,
                thread.tid,
                thread.name,
                thread.process.as_ref().map(|process| process.upid),
            ],
        )
        .with_context(|| format!("failed to insert thread {}", thread.utid))?;
    }
    Ok(())
}

impl Database {
    pub async fn insert_threads(&self, threads: &[ThreadInfo]) -> Result<()> {
        let threads = threads.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            insert_thread_rows(&tx, &threads)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}
