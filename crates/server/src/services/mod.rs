//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration and password login
//! - `catalog` - Categories and products, behind a read cache
//! - `orders` - Order creation and status changes
//! - `payments` - Payments and the order changes they cause
//! - `tickets` - Daily pickup ticket numbers
//! - `dashboard` - Admin dashboard figures
//!
//! Services that change orders publish to the [`Notifier`](crate::realtime::Notifier)
//! after their transaction commits.

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod orders;
pub mod payments;
pub mod tickets;

pub use auth::{AuthError, AuthService, Registration};
pub use catalog::{CatalogError, CatalogService};
pub use dashboard::DashboardStats;
pub use orders::{OrderError, OrderService};
pub use payments::{PaymentError, PaymentService};
