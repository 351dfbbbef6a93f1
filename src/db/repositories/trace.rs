use anyhow::{Context, Result};

use crate::db::{
    models::{ProcessInfo, ThreadInfo, ThreadState},
    Database,
};

use super::{
    thread_states::insert_thread_state_rows,
    threads::{insert_process_rows, insert_thread_rows},
};

impl Database {
    /// Inserts a whole trace in one transaction. Nothing is stored if any row
    /// is rejected.
    pub async fn insert_trace(
        &self,
        processes: &[ProcessInfo],
        threads: &[ThreadInfo],
        states: &[ThreadState],
    ) -> Result<()> {
        let processes = processes.to_vec();
        let threads = threads.to_vec();
        let states = states.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            insert_process_rows(&tx, &processes).context("failed to import processes")?;
            insert_thread_rows(&tx, &threads).context("failed to import threads")?;
            insert_thread_state_rows(&tx, &states).context("failed to import thread states")?;
            tx.commit()?;
            Ok(())
        })
        .await
    }
}
