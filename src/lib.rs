//! Spaced-repetition scheduling and progress tracking for a small
//! course/unit/item language-learning app.
//!
//! The core (`store`, `srs`, `progress`, `session`, `streak`) is synchronous
//! and takes the clock as input. `App` is the caller that wires it to content
//! (`content`), persistence (`db`) and the HTTP surface (`api`).

pub mod api;
pub mod app;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod feedback;
pub mod models;
pub mod progress;
pub mod session;
pub mod srs;
pub mod store;
pub mod streak;

pub use error::LearnError;
