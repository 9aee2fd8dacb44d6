// Library root: re-exports all modules so the CLI and integration tests can
// access the crate's public API.

pub mod config;
pub mod db;
pub mod draft;
pub mod error;
pub mod rankings;
pub mod recommender;
pub mod rules;
pub mod valuation;
