//! Session-based client for the Netflix web service plus the rating-history
//! export app built on top of it.
//!
//! The service has no public API; [`session::Netflix`] authenticates through
//! the HTML login form and recovers API routing data from the configuration
//! object that server-rendered pages build in their inline scripts.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod processor;
pub mod session;
pub mod shutdown;
