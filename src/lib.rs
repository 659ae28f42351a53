//! Guestlist - wedding guest management service
//!
//! This crate provides the REST API for managing wedding guests, their
//! groups and labels, per-function invites, expenses, and spreadsheet import.

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod spreadsheet;
pub mod state;
pub mod validate;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
