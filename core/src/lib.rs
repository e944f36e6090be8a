pub mod cli;
pub mod config;
pub mod elements;
pub mod engine;
pub mod errors;
pub mod event;
pub mod host;
pub mod logging;
pub mod syntax;
pub mod value;

// Re-export the types a host touches most
pub use config::Config;
pub use engine::{ExecutionIntent, Function, Script, Signature, Trigger};
pub use errors::{LoadError, RuntimeError};
pub use event::Event;
pub use host::{Dispatcher, Runtime};
pub use syntax::{Statement, TriggerBuilder};
pub use value::{Timespan, Value, ValueType};
