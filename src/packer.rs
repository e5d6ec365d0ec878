//! Packing engine: assigns a product multiset to box types from a catalog.
//!
//! The engine is a greedy heuristic and a pure function of its inputs:
//! - Infeasible products (too large for the largest box, too heavy for every
//!   box) are reported up front and no assignment is produced
//! - Products and boxes are ordered by ascending volume (stable)
//! - The smallest box that accepts the whole pending set is used; while no box
//!   does, single units of the largest pending product are carried over to a
//!   later box
//!
//! A product's quantity may therefore be split across several boxes, and a
//! box type may be used more than once.

use std::cmp::Ordering;

use thiserror::Error;

use crate::feasibility::{fits_together, unit_fits};
use crate::model::{PackedProduct, PackingAssignment, PackingBox, Product};
use crate::types::{Dimensional, EPSILON_GENERAL};

/// Configuration for the packing engine.
#[derive(Copy, Clone, Debug)]
pub struct PackingConfig {
    /// Numerical tolerance for dimension, volume and weight comparisons
    pub general_epsilon: f64,
}

impl PackingConfig {
    pub const DEFAULT_GENERAL_EPSILON: f64 = EPSILON_GENERAL;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
        }
    }
}

/// Builder for PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Sets the general tolerance.
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Terminal conditions that prevent any packing.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum PackingError {
    #[error("No boxes available to pack products into.")]
    EmptyCatalog,
    #[error("Product {} cannot fit to the largest box.", quote_names(.0))]
    OversizedProduct(Vec<String>),
    #[error("Product {} too heavy for any box.", quote_names(.0))]
    OverweightProduct(Vec<String>),
    #[error("Product {} does not fit into any single box.", quote_names(.0))]
    UnplaceableProduct(Vec<String>),
}

impl PackingError {
    pub fn code(&self) -> &'static str {
        match self {
            PackingError::EmptyCatalog => "empty_catalog",
            PackingError::OversizedProduct(_) => "oversized_product",
            PackingError::OverweightProduct(_) => "overweight_product",
            PackingError::UnplaceableProduct(_) => "unplaceable_product",
        }
    }

    /// Names of the offending products, empty for catalog errors.
    pub fn product_names(&self) -> &[String] {
        match self {
            PackingError::EmptyCatalog => &[],
            PackingError::OversizedProduct(names)
            | PackingError::OverweightProduct(names)
            | PackingError::UnplaceableProduct(names) => names,
        }
    }
}

fn quote_names(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of a packing run.
///
/// `error` and `assignments` are mutually exclusive: a failed run carries no
/// assignments.
#[derive(Clone, Debug, PartialEq)]
pub struct PackingResult {
    pub assignments: Vec<PackingAssignment>,
    pub error: Option<PackingError>,
}

impl PackingResult {
    fn packed(assignments: Vec<PackingAssignment>) -> Self {
        Self {
            assignments,
            error: None,
        }
    }

    fn failed(error: PackingError) -> Self {
        Self {
            assignments: Vec::new(),
            error: Some(error),
        }
    }

    /// Indicates whether every product was packed.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Number of boxes used.
    pub fn box_count(&self) -> usize {
        self.assignments.len()
    }

    /// Number of units placed across all boxes.
    pub fn packed_units(&self) -> u32 {
        self.assignments.iter().map(|a| a.unit_count()).sum()
    }

    /// Packed volume summed over all boxes.
    pub fn total_volume(&self) -> f64 {
        self.assignments.iter().map(|a| a.total_volume).sum()
    }

    /// Packed weight summed over all boxes.
    pub fn total_weight(&self) -> f64 {
        self.assignments.iter().map(|a| a.total_weight).sum()
    }

    /// Human-readable error message, if the run failed.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|err| err.to_string())
    }

    #[allow(dead_code)]
    pub fn into_result(self) -> Result<Vec<PackingAssignment>, PackingError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.assignments),
        }
    }
}

/// Packs products into boxes with the default configuration.
///
/// # Parameters
/// * `products` - Products to pack, product ids unique within the slice
/// * `boxes` - Catalog of box types, each usable any number of times
///
/// # Returns
/// `PackingResult` with one assignment per used box, or an error
pub fn pack(products: &[Product], boxes: &[PackingBox]) -> PackingResult {
    pack_with_config(products, boxes, PackingConfig::default())
}

/// Like `pack`, but with custom parameters.
///
/// Neither input is modified; the engine works on sorted copies.
pub fn pack_with_config(
    products: &[Product],
    boxes: &[PackingBox],
    config: PackingConfig,
) -> PackingResult {
    if products.is_empty() {
        return PackingResult::packed(Vec::new());
    }

    let boxes = sorted_by_volume(boxes);
    if let Err(err) = check_feasibility(products, &boxes, &config) {
        return PackingResult::failed(err);
    }

    match fill_boxes(sorted_by_volume(products), &boxes, &config) {
        Ok(assignments) => PackingResult::packed(assignments),
        Err(err) => PackingResult::failed(err),
    }
}

fn sorted_by_volume<T: Dimensional + Clone>(items: &[T]) -> Vec<T> {
    let mut sorted = items.to_vec();
    // `sort_by` is stable: equal volumes keep their input order.
    sorted.sort_by(|a, b| {
        a.volume()
            .partial_cmp(&b.volume())
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

/// Rejects products that can never be packed, one unit at a time.
///
/// `boxes` must be sorted by ascending volume.
fn check_feasibility(
    products: &[Product],
    boxes: &[PackingBox],
    config: &PackingConfig,
) -> Result<(), PackingError> {
    let eps = config.general_epsilon;
    let Some(largest) = boxes.last() else {
        return Err(PackingError::EmptyCatalog);
    };

    let largest_dims = largest.dimensions();
    let oversized = offending_names(products, |p| !p.fits_in(&largest_dims, eps));
    if !oversized.is_empty() {
        return Err(PackingError::OversizedProduct(oversized));
    }

    let max_weight_limit = boxes
        .iter()
        .map(|b| b.weight_limit)
        .fold(f64::NEG_INFINITY, f64::max);
    let overweight = offending_names(products, |p| p.weight > max_weight_limit + eps);
    if !overweight.is_empty() {
        return Err(PackingError::OverweightProduct(overweight));
    }

    // Dimensions and weight may be satisfied by different boxes only.
    let unplaceable = offending_names(products, |p| !boxes.iter().any(|b| unit_fits(p, b, eps)));
    if !unplaceable.is_empty() {
        return Err(PackingError::UnplaceableProduct(unplaceable));
    }

    Ok(())
}

fn offending_names(products: &[Product], is_offending: impl Fn(&Product) -> bool) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for product in products.iter().filter(|p| is_offending(p)) {
        if !names.contains(&product.name) {
            names.push(product.name.clone());
        }
    }
    names
}

/// Greedy placement loop.
///
/// `pending` and `boxes` must be sorted by ascending volume. Every round
/// emits one assignment holding at least one unit, so the loop terminates
/// after at most as many rounds as there are units.
fn fill_boxes(
    mut pending: Vec<Product>,
    boxes: &[PackingBox],
    config: &PackingConfig,
) -> Result<Vec<PackingAssignment>, PackingError> {
    let eps = config.general_epsilon;
    let mut assignments = Vec::new();
    let mut carried: Vec<Product> = Vec::new();

    while !pending.is_empty() {
        if let Some(target) = boxes.iter().find(|b| fits_together(&pending, b, eps)) {
            let manifest = pending
                .iter()
                .map(|p| PackedProduct::from_product(p, p.quantity))
                .collect();
            assignments.push(PackingAssignment::new(target, manifest));
            pending = sorted_by_volume(&std::mem::take(&mut carried));
            continue;
        }

        if let [only] = pending.as_slice() {
            if only.quantity == 1 {
                return Err(PackingError::UnplaceableProduct(vec![only.name.clone()]));
            }
        }
        carry_one_unit(&mut pending, &mut carried);
    }

    Ok(assignments)
}

/// Moves one unit of the largest pending product to the carry-over list.
fn carry_one_unit(pending: &mut Vec<Product>, carried: &mut Vec<Product>) {
    let Some(largest) = pending.last_mut() else {
        return;
    };

    let unit = largest.with_quantity(1);
    if largest.quantity > 1 {
        largest.quantity -= 1;
    } else {
        pending.pop();
    }

    match carried.iter_mut().find(|p| p.id == unit.id) {
        Some(existing) => existing.quantity += 1,
        None => carried.push(unit),
    }
}
