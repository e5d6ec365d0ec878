//! Data models for the box packing service.
//!
//! This module defines the data structures exchanged with the packing engine:
//! - `Product`: A product type with dimensions, unit weight and requested quantity
//! - `PackingBox`: A box type from the catalog with its weight limit
//! - `PackedProduct`: The share of a product placed into one box
//! - `PackingAssignment`: One used box with its manifest and aggregate figures
//!
//! All structures implement the traits from the `types` module.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Dimensional, Dimensions, Weighted};

/// Validation error for product and box data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Duplicate id: {0}")]
    DuplicateId(u32),
}

fn validate_dimension(value: f64, name: &str, owner: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} of \"{}\" must be positive, got: {}",
            name, owner, value
        )));
    }
    Ok(())
}

fn validate_dimensions(dims: &Dimensions, owner: &str) -> Result<(), ValidationError> {
    if dims.is_valid() {
        return Ok(());
    }
    validate_dimension(dims.length, "Length", owner)?;
    validate_dimension(dims.width, "Width", owner)?;
    validate_dimension(dims.height, "Height", owner)?;
    Ok(())
}

fn validate_weight_value(value: f64, name: &str, owner: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidWeight(format!(
            "{} of \"{}\" must be positive, got: {}",
            name, owner, value
        )));
    }
    Ok(())
}

/// A product type requested for packing.
///
/// # Fields
/// * `id` - Identifier, unique within one packing request
/// * `name` - Display name used in error messages and manifests
/// * `length`, `width`, `height` - Unit dimensions
/// * `weight` - Unit weight in kg
/// * `quantity` - Number of units requested (at least 1)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 5,
    "name": "Phone Charger",
    "length": 8.0,
    "width": 6.0,
    "height": 3.0,
    "weight": 0.2,
    "quantity": 3
}))]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub quantity: u32,
}

impl Product {
    /// Creates a new product with validation.
    ///
    /// # Returns
    /// `Ok(Product)` for valid values, otherwise `Err(ValidationError)`
    pub fn new(
        id: u32,
        name: impl Into<String>,
        dims: Dimensions,
        weight: f64,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        let product = Self {
            id,
            name: name.into(),
            length: dims.length,
            width: dims.width,
            height: dims.height,
            weight,
            quantity,
        };
        product.validate()?;
        Ok(product)
    }

    /// Checks the invariants: positive finite dimensions and weight, quantity >= 1.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimensions(&self.dimensions(), &self.name)?;
        validate_weight_value(self.weight, "Weight", &self.name)?;
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity(format!(
                "Quantity of \"{}\" must be at least 1",
                self.name
            )));
        }
        Ok(())
    }

    /// Returns a copy of this product with a different quantity.
    pub fn with_quantity(&self, quantity: u32) -> Self {
        Self {
            quantity,
            ..self.clone()
        }
    }

    /// Volume of all requested units.
    #[allow(dead_code)]
    pub fn total_volume(&self) -> f64 {
        self.volume() * f64::from(self.quantity)
    }

    /// Weight of all requested units.
    #[allow(dead_code)]
    pub fn total_weight(&self) -> f64 {
        self.weight * f64::from(self.quantity)
    }
}

impl Dimensional for Product {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.length, self.width, self.height)
    }
}

impl Weighted for Product {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// A box type from the catalog.
///
/// Boxes are templates: the engine may use the same box type several times.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "name": "BOX A",
    "length": 10.0,
    "width": 10.0,
    "height": 10.0,
    "weight_limit": 5.0
}))]
pub struct PackingBox {
    pub id: u32,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight_limit: f64,
}

impl PackingBox {
    /// Creates a new box type after validating the parameters.
    #[allow(dead_code)]
    pub fn new(
        id: u32,
        name: impl Into<String>,
        dims: Dimensions,
        weight_limit: f64,
    ) -> Result<Self, ValidationError> {
        let packing_box = Self {
            id,
            name: name.into(),
            length: dims.length,
            width: dims.width,
            height: dims.height,
            weight_limit,
        };
        packing_box.validate()?;
        Ok(packing_box)
    }

    /// Checks for positive finite dimensions and weight limit.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimensions(&self.dimensions(), &self.name)?;
        validate_weight_value(self.weight_limit, "Weight limit", &self.name)?;
        Ok(())
    }
}

impl Dimensional for PackingBox {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.length, self.width, self.height)
    }
}

/// A product's contribution to one specific box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackedProduct {
    pub id: u32,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub quantity: u32,
}

impl PackedProduct {
    /// Projects `quantity` units of `product` into a manifest line.
    pub fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            length: product.length,
            width: product.width,
            height: product.height,
            weight: product.weight,
            quantity,
        }
    }

    /// Volume occupied by this line.
    pub fn total_volume(&self) -> f64 {
        self.volume() * f64::from(self.quantity)
    }

    /// Weight contributed by this line.
    pub fn total_weight(&self) -> f64 {
        self.weight * f64::from(self.quantity)
    }
}

impl Dimensional for PackedProduct {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.length, self.width, self.height)
    }
}

/// One used box with its ordered manifest and aggregate packed figures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PackingAssignment {
    pub box_id: u32,
    #[serde(rename = "box")]
    pub box_name: String,
    pub products: Vec<PackedProduct>,
    pub total_volume: f64,
    pub total_weight: f64,
}

impl PackingAssignment {
    /// Builds an assignment and computes the aggregates from the manifest.
    pub fn new(packing_box: &PackingBox, products: Vec<PackedProduct>) -> Self {
        let total_volume = products.iter().map(PackedProduct::total_volume).sum();
        let total_weight = products.iter().map(PackedProduct::total_weight).sum();
        Self {
            box_id: packing_box.id,
            box_name: packing_box.name.clone(),
            products,
            total_volume,
            total_weight,
        }
    }

    /// Number of units packed into this box.
    pub fn unit_count(&self) -> u32 {
        self.products.iter().map(|p| p.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    fn charger(quantity: u32) -> Product {
        Product::new(5, "Phone Charger", Dimensions::new(8.0, 6.0, 3.0), 0.2, quantity).unwrap()
    }

    #[test]
    fn product_rejects_invalid_values() {
        let dims = Dimensions::new(8.0, 6.0, 3.0);
        assert!(matches!(
            Product::new(1, "a", Dimensions::new(-8.0, 6.0, 3.0), 1.0, 1),
            Err(ValidationError::InvalidDimension(_))
        ));
        assert!(matches!(
            Product::new(1, "a", dims, 0.0, 1),
            Err(ValidationError::InvalidWeight(_))
        ));
        assert!(matches!(
            Product::new(1, "a", dims, 1.0, 0),
            Err(ValidationError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn box_rejects_invalid_weight_limit() {
        let result = PackingBox::new(1, "BOX A", Dimensions::new(10.0, 10.0, 10.0), f64::NAN);
        assert!(matches!(result, Err(ValidationError::InvalidWeight(_))));
    }

    #[test]
    fn product_totals_scale_with_quantity() {
        let product = charger(3);
        assert!((product.volume() - 144.0).abs() < EPSILON_GENERAL);
        assert!((product.total_volume() - 432.0).abs() < EPSILON_GENERAL);
        assert!((product.total_weight() - 0.6).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn assignment_aggregates_manifest() {
        let packing_box =
            PackingBox::new(1, "BOX A", Dimensions::new(10.0, 10.0, 10.0), 5.0).unwrap();
        let product = charger(3);
        let assignment = PackingAssignment::new(
            &packing_box,
            vec![
                PackedProduct::from_product(&product, 2),
                PackedProduct::from_product(&product, 1),
            ],
        );

        assert_eq!(assignment.box_name, "BOX A");
        assert_eq!(assignment.unit_count(), 3);
        assert!((assignment.total_volume - 432.0).abs() < EPSILON_GENERAL);
        assert!((assignment.total_weight - 0.6).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn assignment_serializes_box_name_as_box() {
        let packing_box =
            PackingBox::new(1, "BOX A", Dimensions::new(10.0, 10.0, 10.0), 5.0).unwrap();
        let assignment = PackingAssignment::new(&packing_box, Vec::new());
        let value = serde_json::to_value(&assignment).unwrap();
        assert_eq!(value["box"], "BOX A");
        assert_eq!(value["box_id"], 1);
    }
}
