pub mod config;
pub mod error;

pub use config::{load_dotenv, FasyncConfig, IdleStrategy, SchedulerConfig, SignalConfig};
pub use error::*;
