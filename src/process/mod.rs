//! Process slots, pools, and lifecycle state.

pub mod pool;
pub mod status;

pub use pool::{ProcessId, ProcessPool};
pub use status::{ExecutionContext, ProcessStatus};
