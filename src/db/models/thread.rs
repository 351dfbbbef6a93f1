//! Thread and process identity attached to thread states.

use serde::{Deserialize, Serialize};

use super::thread_state::Utid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    pub upid: i64,
    pub pid: Option<i64>,
    pub name: Option<String>,
}

impl ProcessInfo {
    pub fn display_name(&self) -> String {
        match (&self.name, self.pid) {
            (Some(name), Some(pid)) => format!("{name} [{pid}]"),
            (Some(name), None) => name.clone(),
            (None, Some(pid)) => format!("[{pid}]"),
            (None, None) => format!("upid {}", self.upid),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadInfo {
    pub utid: Utid,
    pub tid: Option<i64>,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessInfo>,
}

impl ThreadInfo {
    pub fn display_name(&self) -> String {
        match (&self.name, self.tid) {
            (Some(name), Some(tid)) => format!("{name} [{tid}]"),
            (Some(name), None) => name.clone(),
            (None, Some(tid)) => format!("[{tid}]"),
            (None, None) => format!("utid {}", self.utid),
        }
    }

    /// Thread name followed by its process, e.g. `RenderThread [812] com.app [800]`.
    pub fn full_name(&self) -> String {
        match &self.process {
            Some(process) => format!("{} {}", self.display_name(), process.display_name()),
            None => self.display_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_includes_process() {
        let thread = ThreadInfo {
            utid: Utid(3),
            tid: Some(812),
            name: Some("RenderThread".into()),
            process: Some(ProcessInfo {
                upid: 1,
                pid: Some(800),
                name: Some("com.app".into()),
            }),
        };
        assert_eq!(thread.full_name(), "RenderThread [812] com.app [800]");
    }

    #[test]
    fn display_name_falls_back_to_ids() {
        let thread = ThreadInfo {
            utid: Utid(3),
            tid: None,
            name: None,
            process: None,
        };
        assert_eq!(thread.display_name(), "utid 3");
        assert_eq!(thread.full_name(), "utid 3");
    }
}
