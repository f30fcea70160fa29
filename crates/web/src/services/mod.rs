//! Business logic services.
//!
//! # Services
//!
//! - `admin` - Decides whether the signed-in user is the configured admin
//! - `posts` - Post validation and slug assignment shared by the API and admin forms

pub mod admin;
pub mod posts;
