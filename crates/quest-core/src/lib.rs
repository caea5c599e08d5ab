//! Core types for the quest system.
//!
//! Domain records, enums, validation, and the two pure calculators the
//! completion engine is built on: [`level::LevelCurve`] and
//! [`streak::advance`].

pub mod activity;
pub mod badge;
pub mod enums;
pub mod filter;
pub mod level;
pub mod session;
pub mod setting;
pub mod stats;
pub mod streak;
pub mod task;
pub mod user;
pub mod validation;
