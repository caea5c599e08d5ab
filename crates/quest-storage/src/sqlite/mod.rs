//! SQLite-backed storage implementation.

mod activity;
mod badges;
mod daily_stats;
pub mod schema;
mod sessions;
mod settings;
mod store;
mod tasks;
mod time;
mod transaction;
mod users;
mod views;

pub use store::SqliteStore;
