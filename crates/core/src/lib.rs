//! Green Fig Core - Shared domain types.
//!
//! This crate provides common types used across all Green Fig components:
//! - `identity` - Authentication and session lifecycle
//! - the store backend services (catalog, cart, checkout)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, usernames, and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
