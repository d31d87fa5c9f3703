//! Session orchestration engine
//!
//! Fans one poll loop out per spec file under a bounded concurrency
//! cap and collects every outcome.

mod collector;
mod dispatch;
mod poll;

pub use collector::ResultCollector;
pub use dispatch::{Dispatcher, DispatcherConfig, RunRequest};
pub use poll::{PollConfig, PollLoop};
