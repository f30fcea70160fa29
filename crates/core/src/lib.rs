//! Tech Blog Core - Shared types and pure helpers.
//!
//! This crate provides the building blocks used by the other workspace members:
//! - `web` - Public blog, admin panel and JSON API
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and post status
//! - [`slug`] - URL slugs and heading anchors
//! - [`format`] - Date and text formatting for display
//! - [`pagination`] - Offset pagination arithmetic and page-link windows
//! - [`toc`] - Table of contents extraction from markdown

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod format;
pub mod pagination;
pub mod slug;
pub mod toc;
pub mod types;

pub use types::*;
