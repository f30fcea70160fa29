//! Tech blog web application as a library.
//!
//! The binary in `main.rs` wires configuration, tracing and Sentry around
//! [`routes::app`]. Everything else lives here so it can be tested and reused
//! by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod filters;
pub mod github;
pub mod markdown;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod uploads;
pub mod views;
