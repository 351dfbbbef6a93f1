//! Filter description for thread-state lookups.
//!
//! A query is a conjunction of constraints. Values are always bound as
//! parameters when rendered to SQL.

use rusqlite::types::Value;

use super::models::{ThreadStateId, Utid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// `ts + dur = value`
    EndsAt(i64),
    /// `ts = value`
    StartsAt(i64),
    OnThread(Utid),
    WokenBy(ThreadStateId),
    /// Interrupt context is NULL or false.
    NotInterruptWakeup,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadStateQuery {
    pub constraints: Vec<Constraint>,
    pub limit: Option<u32>,
    pub order_by_ts: bool,
}

impl ThreadStateQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn ordered_by_ts(mut self) -> Self {
        self.order_by_ts = true;
        self
    }

    /// Renders the WHERE/ORDER/LIMIT tail. Column names are qualified with `alias`.
    pub fn to_sql(&self, alias: &str) -> (String, Vec<Value>) {
        let mut clauses = Vec::with_capacity(self.constraints.len());
        let mut params = Vec::new();

        for constraint in &self.constraints {
            let index = params.len() + 1;
            match *constraint {
                Constraint::EndsAt(end) => {
                    clauses.push(format!("{alias}.ts + {alias}.dur = ?{index}"));
                    params.push(Value::Integer(end));
                }
                Constraint::StartsAt(start) => {
                    clauses.push(format!("{alias}.ts = ?{index}"));
                    params.push(Value::Integer(start));
                }
                Constraint::OnThread(utid) => {
                    clauses.push(format!("{alias}.utid = ?{index}"));
                    params.push(Value::Integer(utid.0));
                }
                Constraint::WokenBy(id) => {
                    clauses.push(format!("{alias}.waker_id = ?{index}"));
                    params.push(Value::Integer(id.0));
                }
                Constraint::NotInterruptWakeup => {
                    clauses.push(format!(
                        "({alias}.irq_context IS NULL OR {alias}.irq_context = 0)"
                    ));
                }
            }
        }

        let mut sql = String::new();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        if self.order_by_ts {
            sql.push_str(&format!(" ORDER BY {alias}.ts ASC, {alias}.id ASC"));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        (sql, params)
    }

    /// Evaluates the constraints against one row, for stores that filter in memory.
    pub fn matches(&self, state: &super::models::ThreadState) -> bool {
        self.constraints.iter().all(|constraint| match *constraint {
            Constraint::EndsAt(end) => state.end_ts() == end,
            Constraint::StartsAt(start) => state.ts == start,
            Constraint::OnThread(utid) => state.utid == utid,
            Constraint::WokenBy(id) => state.waker_id == Some(id),
            Constraint::NotInterruptWakeup => state.woken_outside_interrupt(),
        })
    }
}
