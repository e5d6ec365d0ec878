//! Common types and traits for box geometry.
//!
//! Products and boxes share the same notion of an axis-aligned extent
//! (length × width × height). Items are never rotated, so every comparison
//! is made axis by axis.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
///
/// Used for dimension, volume and weight comparisons.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Axis-aligned extent of a product or box.
///
/// # Examples
/// ```ignore
/// let dims = Dimensions::new(8.0, 6.0, 3.0);
/// assert_eq!(dims.volume(), 144.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    /// Creates a new extent.
    #[inline]
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    /// Calculates the volume (product of all components).
    #[inline]
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Checks if all components are positive and finite.
    #[inline]
    pub fn is_valid(&self) -> bool {
        [self.length, self.width, self.height]
            .iter()
            .all(|v| *v > 0.0 && v.is_finite())
    }

    /// Checks if this extent fits within another one (component-wise <=).
    ///
    /// # Parameters
    /// * `outer` - The enclosing extent (e.g. box dimensions)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.length <= outer.length + tolerance
            && self.width <= outer.width + tolerance
            && self.height <= outer.height + tolerance
    }
}

/// Trait for objects with an axis-aligned extent.
pub trait Dimensional {
    /// Returns the dimensions of the object.
    fn dimensions(&self) -> Dimensions;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }

    /// Checks if this object fits into the given extent without rotation.
    fn fits_in(&self, outer: &Dimensions, tolerance: f64) -> bool {
        self.dimensions().fits_within(outer, tolerance)
    }
}

/// Trait for objects with weight.
pub trait Weighted {
    /// Returns the weight in kg.
    fn weight(&self) -> f64;
}
