//! Product selection keyed by product id.
//!
//! The selection is the caller-side order that feeds the packing engine. It
//! enforces the cap on the total number of units; the engine itself does not.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::catalog::Catalog;
use crate::model::Product;

/// Errors raised while editing or resolving a selection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("You can only input up to {0} products.")]
    LimitExceeded(u32),
    #[error("Unknown product: {0}")]
    UnknownProduct(u32),
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
}

/// One selected product and its quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SelectionLine {
    pub product_id: u32,
    pub quantity: u32,
}

/// Selected products in insertion order, at most one line per product id.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    max_units: u32,
    lines: Vec<SelectionLine>,
}

impl Selection {
    pub const DEFAULT_MAX_UNITS: u32 = 10;

    /// Creates an empty selection with the given unit cap.
    pub fn new(max_units: u32) -> Self {
        Self {
            max_units,
            lines: Vec::new(),
        }
    }

    /// Adds units of a product, merging with an existing line for the same id.
    pub fn add(&mut self, product_id: u32, quantity: u32) -> Result<(), SelectionError> {
        if quantity == 0 {
            return Err(SelectionError::InvalidQuantity);
        }
        self.ensure_capacity(quantity)?;
        match self.line_mut(product_id) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(SelectionLine {
                product_id,
                quantity,
            }),
        }
        Ok(())
    }

    /// Adds one unit to an already selected product.
    #[allow(dead_code)]
    pub fn increase(&mut self, product_id: u32) -> Result<(), SelectionError> {
        self.ensure_capacity(1)?;
        let line = self
            .line_mut(product_id)
            .ok_or(SelectionError::UnknownProduct(product_id))?;
        line.quantity += 1;
        Ok(())
    }

    /// Removes one unit; a line never drops below one unit.
    #[allow(dead_code)]
    pub fn decrease(&mut self, product_id: u32) -> Result<(), SelectionError> {
        let line = self
            .line_mut(product_id)
            .ok_or(SelectionError::UnknownProduct(product_id))?;
        if line.quantity > 1 {
            line.quantity -= 1;
        }
        Ok(())
    }

    /// Drops a product from the selection.
    #[allow(dead_code)]
    pub fn remove(&mut self, product_id: u32) -> Result<SelectionLine, SelectionError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.product_id == product_id)
            .ok_or(SelectionError::UnknownProduct(product_id))?;
        Ok(self.lines.remove(index))
    }

    #[allow(dead_code)]
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[allow(dead_code)]
    pub fn lines(&self) -> &[SelectionLine] {
        &self.lines
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of selected units across all products.
    pub fn total_units(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Builds packing products from the catalog records.
    pub fn resolve(&self, catalog: &Catalog) -> Result<Vec<Product>, SelectionError> {
        self.lines
            .iter()
            .map(|line| {
                catalog
                    .find_product(line.product_id)
                    .ok_or(SelectionError::UnknownProduct(line.product_id))?
                    .to_product_with_quantity(line.quantity)
                    .map_err(|_| SelectionError::InvalidQuantity)
            })
            .collect()
    }

    fn ensure_capacity(&self, additional: u32) -> Result<(), SelectionError> {
        if self.total_units().saturating_add(additional) > self.max_units {
            return Err(SelectionError::LimitExceeded(self.max_units));
        }
        Ok(())
    }

    fn line_mut(&mut self, product_id: u32) -> Option<&mut SelectionLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_UNITS)
    }
}

/// Checks a ready-made product list against the unit cap.
pub fn enforce_unit_cap(products: &[Product], max_units: u32) -> Result<(), SelectionError> {
    let total = products
        .iter()
        .fold(0u32, |sum, product| sum.saturating_add(product.quantity));
    if total > max_units {
        return Err(SelectionError::LimitExceeded(max_units));
    }
    Ok(())
}
