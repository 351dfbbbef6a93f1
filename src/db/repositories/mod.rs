pub mod thread_states;
pub mod threads;
pub mod trace;
