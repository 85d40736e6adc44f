//! Core module containing the asynchronous task pipeline
//!
//! This module contains:
//! - Task, result and group models and the status state machine
//! - The chart worker consuming the task queue
//! - The task manager used by the HTTP layer

mod group;
mod manager;
mod task;
mod task_result;
mod task_state;
mod worker;

pub use group::*;
pub use manager::*;
pub use task::*;
pub use task_result::*;
pub use task_state::*;
pub use worker::*;
