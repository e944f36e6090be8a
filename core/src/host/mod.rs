//! Host-side collaborators: scheduling, local variables and event routing

pub mod dispatcher;
pub mod runtime;
pub mod scheduler;
pub mod variables;

pub use dispatcher::Dispatcher;
pub use runtime::Runtime;
pub use scheduler::{HostLoop, Scheduler, Task, TickScheduler, TokioScheduler};
pub use variables::{Locals, MemoryVariableStore, VariableStore};
