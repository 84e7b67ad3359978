//! Async Rust client for the Bloom Growth project-management API.
//!
//! The crate exposes one [`Client`] that hands out per-resource facades
//! (users, meetings, todos, goals, scorecards, issues, headlines). Every
//! facade method is a thin translation from a method call to one or more
//! HTTP requests, plus reshaping of the JSON response into typed models.
//!
//! Bulk creation is best-effort: see [`core::bulk`] for the execution
//! contract shared by the sequential and bounded-concurrency paths.

pub mod client;
pub mod core;
pub mod gateway;
pub mod mapper;
pub mod models;
pub mod resources;

pub use client::Client;
pub use core::bulk::{BulkFailure, BulkResult};
pub use core::config::Configuration;
pub use core::error::{BloomyError, Result};
pub use models::GoalStatus;

pub const DEFAULT_BASE_URL: &str = "https://app.bloomgrowth.com/api/v1";

pub const API_KEY_ENV: &str = "BG_API_KEY";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_MAX_CONCURRENT: usize = 5;
