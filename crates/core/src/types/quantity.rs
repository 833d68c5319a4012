//! Line item quantity.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a quantity is zero or negative.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("quantity must be a positive integer (got {0})")]
pub struct InvalidQuantity(pub i64);

/// A strictly positive item count.
///
/// Stored as `INTEGER` alongside a `CHECK (quantity >= 1)` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// One item; the default when a request omits the quantity.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQuantity`] for values below one or above `i32::MAX`.
    pub fn new(value: i64) -> Result<Self, InvalidQuantity> {
        i32::try_from(value)
            .ok()
            .filter(|v| *v >= 1)
            .map(Self)
            .ok_or(InvalidQuantity(value))
    }

    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<i64> for Quantity {
    type Error = InvalidQuantity;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
