//! Command handlers, one module per top-level subcommand.

pub mod badge;
pub mod completion;
pub mod init;
pub mod log;
pub mod session;
pub mod settings;
pub mod stats;
pub mod summary;
pub mod task;
pub mod tasks;
pub mod user;
