pub mod driver;
pub mod trace;
pub mod workload;

pub use driver::{Outcome, Sim};
pub use trace::{Trace, TraceEvent, TraceKind};
pub use workload::JobSpec;
