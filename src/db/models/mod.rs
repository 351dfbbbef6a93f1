pub mod thread;
pub mod thread_state;

pub use thread::{ProcessInfo, ThreadInfo};
pub use thread_state::{describe_state, SchedId, ThreadState, ThreadStateId, Utid};
