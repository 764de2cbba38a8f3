//! Worker pool and the public scheduler facade.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, constructors, submission and accessors
//! - `worker`: worker thread spawning and the fetch/execute loop
//! - `shutdown`: drain-to-empty teardown, explicit and on drop

mod core;
mod shutdown;
mod worker;

pub use self::core::Scheduler;
