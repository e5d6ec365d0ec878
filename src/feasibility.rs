//! Feasibility checks for adding products to a box.
//!
//! A box's interior is treated as two independent scalar budgets (total
//! volume and total weight) plus an axis-aligned bounding check per item.
//! No positions are computed.

use crate::model::{PackingBox, Product};
use crate::types::{Dimensional, Weighted};

/// Accumulated weight and volume of the items already assigned to a box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxLoad {
    pub weight: f64,
    pub volume: f64,
}

impl BoxLoad {
    /// An empty box.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Adds `quantity` units of `product` to the load.
    pub fn add(&mut self, product: &Product, quantity: u32) {
        let count = f64::from(quantity);
        self.weight += product.weight() * count;
        self.volume += product.volume() * count;
    }
}

/// Decides whether `quantity` units of `product` can be added to `packing_box`
/// on top of `load`.
///
/// All of the following must hold:
/// * every axis of a single unit is <= the corresponding box axis
/// * `load.weight + weight × quantity <= weight_limit`
/// * `load.volume + volume × quantity <= box volume`
pub fn can_add(
    product: &Product,
    quantity: u32,
    packing_box: &PackingBox,
    load: &BoxLoad,
    epsilon: f64,
) -> bool {
    let count = f64::from(quantity);
    product.fits_in(&packing_box.dimensions(), epsilon)
        && load.weight + product.weight() * count <= packing_box.weight_limit + epsilon
        && load.volume + product.volume() * count <= packing_box.volume() + epsilon
}

/// Checks whether a single unit fits an empty box.
pub fn unit_fits(product: &Product, packing_box: &PackingBox, epsilon: f64) -> bool {
    can_add(product, 1, packing_box, &BoxLoad::empty(), epsilon)
}

/// Checks whether every line, with its full quantity, fits into one box together.
///
/// Lines are added in the given order; the check stops at the first line
/// that would overflow the box.
pub fn fits_together(lines: &[Product], packing_box: &PackingBox, epsilon: f64) -> bool {
    let mut load = BoxLoad::empty();
    for line in lines {
        if !can_add(line, line.quantity, packing_box, &load, epsilon) {
            return false;
        }
        load.add(line, line.quantity);
    }
    true
}
