//! Fast Lanche ordering server library.
//!
//! The binary in `main.rs` wires these modules into an Axum app; the CLI
//! reuses the repositories and password hashing.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;
