//! Fast Lanche Core - Shared domain types.
//!
//! This crate provides the types used across the Fast Lanche components:
//! - `server` - JSON API, WebSocket notifier, and order/payment workflows
//! - `cli` - Command-line tools for migrations and admin management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. Anything that needs a clock or a connection takes it as an
//! argument, which keeps ticket arithmetic and status rules unit-testable.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money, emails, statuses, roles, and ticket numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
