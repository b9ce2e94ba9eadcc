//! Side-effecting helpers: filesystem, child processes, oracle backends.

pub mod config;
pub mod oracle;
pub mod process;
pub mod prompt;
pub mod result_store;
pub mod sandbox;
pub mod task_file;
pub mod transcript;
