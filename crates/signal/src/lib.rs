//! Multicast notification channel.
//!
//! This crate provides:
//! - [`Signal`], an append-only list of subscribers sharing one argument type
//! - synchronous delivery via [`Signal::notify`]
//! - asynchronous delivery on dedicated threads via [`Signal::emit_async`],
//!   [`Signal::emit_async_into`] and [`Signal::emit_async_multi`], joined
//!   through [`Emission`] / [`EmissionGroup`]
//! - free `connect*` / [`emit`] helpers for binding methods of shared targets
//!
//! Several arguments travel as a tuple: `Signal<(i32, i32)>`.

pub mod connect;
pub mod emit;
pub mod error;
pub mod signal;

pub use connect::{connect, connect_method, connect_weak, emit};
pub use emit::{Emission, EmissionGroup};
pub use error::SignalError;
pub use fasync_core::SignalConfig;
pub use signal::{Signal, Subscriber};
