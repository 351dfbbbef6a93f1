use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Row, Transaction};

use crate::db::{
    helpers::{parse_optional_flag, parse_optional_i32, parse_optional_u32},
    models::{ProcessInfo, SchedId, ThreadInfo, ThreadState, ThreadStateId, Utid},
    query::ThreadStateQuery,
    Database,
};

const SELECT_THREAD_STATE: &str = "SELECT
        s.id,
        s.ts,
        s.dur,
        s.utid,
        s.state,
        s.cpu,
        s.sched_id,
        s.priority,
        s.blocked_function,
        s.waker_id,
        s.irq_context,
        t.utid AS thread_utid,
        t.tid,
        t.name AS thread_name,
        t.upid,
        p.pid,
        p.name AS process_name
    FROM thread_state s
    LEFT JOIN thread t ON t.utid = s.utid
    LEFT JOIN process p ON p.upid = t.upid";

fn row_to_thread_state(row: &Row) -> Result<ThreadState> {
    let cpu: Option<i64> = row.get("cpu")?;
    let priority: Option<i64> = row.get("priority")?;
    let irq_context: Option<i64> = row.get("irq_context")?;
    let thread_utid: Option<i64> = row.get("thread_utid")?;

    let thread = match thread_utid {
        Some(utid) => {
            let upid: Option<i64> = row.get("upid")?;
            let process = match upid {
                Some(upid) => Some(ProcessInfo {
                    upid,
                    pid: row.get("pid")?,
                    name: row.get("process_name")?,
                }),
                None => None,
            };
            Some(ThreadInfo {
                utid: Utid(utid),
                tid: row.get("tid")?,
                name: row.get("thread_name")?,
                process,
            })
        }
        None => None,
    };

    Ok(ThreadState {
        id: ThreadStateId(row.get("id")?),
        ts: row.get("ts")?,
        dur: row.get("dur")?,
        utid: Utid(row.get("utid")?),
        state: row.get("state")?,
        cpu: parse_optional_u32(cpu, "cpu")?,
        sched_id: row.get::<_, Option<i64>>("sched_id")?.map(SchedId),
        priority: parse_optional_i32(priority, "priority")?,
        blocked_function: row.get("blocked_function")?,
        waker_id: row.get::<_, Option<i64>>("waker_id")?.map(ThreadStateId),
        waker_interrupt_ctx: parse_optional_flag(irq_context),
        thread,
    })
}

/// Owning threads must already exist.
pub(crate) fn insert_thread_state_rows(tx: &Transaction, states: &[ThreadState]) -> Result<()> {
    for state in states {
        tx.execute(
            "INSERT INTO thread_state (
                id,
                ts,
                dur,
                utid,
                state,
                cpu,
                sched_id,
                priority,
                blocked_function,
                waker_id,
                irq_context
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                state.id.0,
                state.ts,
                state.dur,
                state.utid.0,
                state.state,
                state.cpu,
                state.sched_id.map(|id| id.0),
                state.priority,
                state.blocked_function,
                state.waker_id.map(|id| id.0),
                state.waker_interrupt_ctx,
            ],
        )
        .with_context(|| format!("failed to insert thread state {}", state.id))?;
    }
    Ok(())
}

impl Database {
    /// Batch insert thread states in one transaction.
    pub async fn insert_thread_states(&self, states: &[ThreadState]) -> Result<()> {
        let states = states.to_vec();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            insert_thread_state_rows(&tx, &states)?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn get_thread_state(&self, id: ThreadStateId) -> Result<Option<ThreadState>> {
        self.execute(move |conn| {
            let sql = format!("{SELECT_THREAD_STATE} WHERE s.id = ?1");
            let mut stmt = conn.prepare_cached(&sql)?;
            let mut rows = stmt.query(params![id.0])?;
            match rows.next()? {
                Some(row) => Ok(Some(row_to_thread_state(row)?)),
                None => Ok(None),
            }
        })
        .await
        .with_context(|| format!("failed to fetch thread state {id}"))
    }

    pub async fn get_thread_states_where(
        &self,
        query: &ThreadStateQuery,
    ) -> Result<Vec<ThreadState>> {
        let query = query.clone();
        self.execute(move |conn| {
            let (tail, values) = query.to_sql("s");
            let sql = format!("{SELECT_THREAD_STATE}{tail}");
            let mut stmt = conn
                .prepare_cached(&sql)
                .with_context(|| format!("failed to prepare thread state query {query:?}"))?;

            let mut rows = stmt.query(params_from_iter(values))?;
            let mut states = Vec::new();
            while let Some(row) = rows.next()? {
                states.push(row_to_thread_state(row)?);
            }

            Ok(states)
        })
        .await
    }

    pub async fn count_thread_states(&self) -> Result<u64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM thread_state", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
    }
}
