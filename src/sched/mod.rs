pub mod dispatcher;
pub mod job;
pub mod observer;
pub mod queue;
pub mod stats;

pub use dispatcher::Dispatcher;
pub use job::{CoreId, Job, JobId, Priority, Ticks};
pub use observer::Observer;
pub use queue::{PendingQueue, QueueOrder};
pub use stats::SchedStats;
