//! Synchronization between tasks
//!
//! Contains the join protocol: `exit` and `wait`.

mod join;
