//! Core runtime modules
//!
//! Contains the runtime state, task records, queues, the scheduler and
//! dispatcher, and tick handling.

pub mod config;
pub mod critical;
pub mod cs_cell;
pub mod error;
pub mod hooks;
pub mod kernel;
pub mod queue;
pub mod sched;
pub mod stack;
pub mod task;
pub mod time;
pub mod types;
