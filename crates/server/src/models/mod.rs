//! Domain models.
//!
//! Row types double as API representations: they derive `sqlx::FromRow` for
//! reads and `Serialize` (camelCase) for responses. Request payloads live next
//! to the model they create or change.

pub mod catalog;
pub mod order;
pub mod payment;
pub mod session;
pub mod user;

pub use catalog::{Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductUpdate};
pub use order::{NewOrderItem, Order, OrderItem, OrderItemDetail, OrderWithItems};
pub use payment::Payment;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
