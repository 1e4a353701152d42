//! Core types for Fast Lanche.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod status;
pub mod ticket;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use status::*;
pub use ticket::{TicketCode, TicketCounter};
