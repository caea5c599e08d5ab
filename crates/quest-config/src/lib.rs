//! Configuration management for the quest system.
//!
//! This crate handles loading and saving `.quest/config.yaml` files,
//! discovering `.quest/` directories in the filesystem, and turning the
//! gamification section into `app_settings` rows.

pub mod config;
pub mod quest_dir;
