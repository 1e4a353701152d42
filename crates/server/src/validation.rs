//! Field-level validation errors.
//!
//! Paths use the request's JSON field names (`items[2].productId`) so clients
//! can attach messages to form fields directly.

use std::fmt;

use serde::Serialize;

use fastlanche_core::Money;

/// One invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// A non-empty set of field errors, collected before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// A set holding exactly one error.
    #[must_use]
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(path, message);
        errors
    }

    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            path: path.into(),
            message: message.into(),
        });
    }

    /// Record an error at `path` if `value` is blank.
    pub fn require_text(&mut self, path: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(path, "is required");
        }
    }

    /// Record an error at `path` if `amount` is below zero.
    pub fn require_non_negative(&mut self, path: &str, amount: Money) {
        if amount.is_negative() {
            self.add(path, "must not be negative");
        }
    }

    /// Record an error at `path` if `amount` is too large to store.
    pub fn require_storable(&mut self, path: &str, amount: Money) {
        if !amount.is_storable() {
            self.add(
                path,
                format!("must not exceed {}", Money::max_storable()),
            );
        }
    }

    /// A catalog price: neither negative nor too large to store.
    pub fn require_price(&mut self, path: &str, amount: Money) {
        self.require_non_negative(path, amount);
        self.require_storable(path, amount);
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// `Ok` if nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field error was recorded.
    pub fn finish(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.path, err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
