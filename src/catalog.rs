//! Product and box catalogs.
//!
//! Catalogs are plain JSON arrays. The defaults shipped in `data/` are
//! embedded into the binary; configured file paths replace them.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::{PackingBox, Product, ValidationError};
use crate::types::Dimensions;

const BUILTIN_PRODUCTS: &str = include_str!("../data/products.json");
const BUILTIN_BOXES: &str = include_str!("../data/boxes.json");

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Could not read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid entry in {origin}: {source}")]
    Invalid {
        origin: String,
        #[source]
        source: ValidationError,
    },
    #[error("Box catalog {0} contains no boxes")]
    NoBoxes(String),
}

/// A product record as offered by the catalog, without a quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 37,
    "name": "Speaker System",
    "length": 60.0,
    "width": 35.0,
    "height": 40.0,
    "weight": 10.0
}))]
pub struct CatalogProduct {
    pub id: u32,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
}

impl CatalogProduct {
    /// Builds a packing product with a single unit.
    #[allow(dead_code)]
    pub fn to_product(&self) -> Product {
        Product {
            id: self.id,
            name: self.name.clone(),
            length: self.length,
            width: self.width,
            height: self.height,
            weight: self.weight,
            quantity: 1,
        }
    }

    /// Builds a packing product with the requested quantity.
    pub fn to_product_with_quantity(&self, quantity: u32) -> Result<Product, ValidationError> {
        Product::new(
            self.id,
            self.name.clone(),
            Dimensions::new(self.length, self.width, self.height),
            self.weight,
            quantity,
        )
    }
}

/// Read-only product and box catalogs, loaded once per process.
#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    products: Vec<CatalogProduct>,
    boxes: Vec<PackingBox>,
}

impl Catalog {
    /// Catalog built from the embedded default data.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(
            BUILTIN_PRODUCTS,
            "built-in products",
            BUILTIN_BOXES,
            "built-in boxes",
        )
    }

    /// Loads the catalog, reading each part from a file when a path is given.
    pub fn load(
        products_path: Option<&Path>,
        boxes_path: Option<&Path>,
    ) -> Result<Self, CatalogError> {
        let (products_raw, products_origin) =
            read_source(products_path, BUILTIN_PRODUCTS, "built-in products")?;
        let (boxes_raw, boxes_origin) =
            read_source(boxes_path, BUILTIN_BOXES, "built-in boxes")?;
        Self::from_json(&products_raw, &products_origin, &boxes_raw, &boxes_origin)
    }

    fn from_json(
        products_raw: &str,
        products_origin: &str,
        boxes_raw: &str,
        boxes_origin: &str,
    ) -> Result<Self, CatalogError> {
        let products: Vec<CatalogProduct> = parse(products_raw, products_origin)?;
        let boxes: Vec<PackingBox> = parse(boxes_raw, boxes_origin)?;
        Self::new(products, boxes, products_origin, boxes_origin)
    }

    fn new(
        products: Vec<CatalogProduct>,
        boxes: Vec<PackingBox>,
        products_origin: &str,
        boxes_origin: &str,
    ) -> Result<Self, CatalogError> {
        let invalid_products = |source| CatalogError::Invalid {
            origin: products_origin.to_string(),
            source,
        };
        let invalid_boxes = |source| CatalogError::Invalid {
            origin: boxes_origin.to_string(),
            source,
        };

        for product in &products {
            product.to_product_with_quantity(1).map_err(invalid_products)?;
        }
        ensure_unique_ids(products.iter().map(|p| p.id)).map_err(invalid_products)?;

        if boxes.is_empty() {
            return Err(CatalogError::NoBoxes(boxes_origin.to_string()));
        }
        for packing_box in &boxes {
            packing_box.validate().map_err(invalid_boxes)?;
        }
        ensure_unique_ids(boxes.iter().map(|b| b.id)).map_err(invalid_boxes)?;

        Ok(Self { products, boxes })
    }

    pub fn products(&self) -> &[CatalogProduct] {
        &self.products
    }

    pub fn boxes(&self) -> &[PackingBox] {
        &self.boxes
    }

    /// Looks up a catalog product by id.
    pub fn find_product(&self, id: u32) -> Option<&CatalogProduct> {
        self.products.iter().find(|p| p.id == id)
    }
}

fn read_source(
    path: Option<&Path>,
    builtin: &str,
    builtin_origin: &str,
) -> Result<(String, String), CatalogError> {
    match path {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Ok((raw, path.display().to_string()))
        }
        None => Ok((builtin.to_string(), builtin_origin.to_string())),
    }
}

fn parse<T: for<'de> Deserialize<'de>>(raw: &str, origin: &str) -> Result<Vec<T>, CatalogError> {
    serde_json::from_str(raw).map_err(|source| CatalogError::Parse {
        origin: origin.to_string(),
        source,
    })
}

pub(crate) fn ensure_unique_ids(ids: impl IntoIterator<Item = u32>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId(id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::packer::pack;

    fn builtin() -> Catalog {
        Catalog::builtin().expect("built-in catalog must be valid")
    }

    fn order(catalog: &Catalog, lines: &[(u32, u32)]) -> Vec<Product> {
        lines
            .iter()
            .map(|(id, quantity)| {
                catalog
                    .find_product(*id)
                    .expect("unknown product id")
                    .to_product_with_quantity(*quantity)
                    .unwrap()
            })
            .collect()
    }

    fn packed_box_names(catalog: &Catalog, lines: &[(u32, u32)]) -> Vec<String> {
        let result = pack(&order(catalog, lines), catalog.boxes());
        assert!(result.is_success(), "unexpected error: {:?}", result.error);
        result.assignments.into_iter().map(|a| a.box_name).collect()
    }

    #[test]
    fn builtin_catalog_loads() {
        let catalog = builtin();
        assert_eq!(catalog.boxes().len(), 5);
        assert!(catalog.find_product(5).is_some());
        assert!(catalog.find_product(37).is_some());
        assert!(catalog.find_product(999).is_none());
    }

    #[test]
    fn catalog_product_defaults_to_single_unit() {
        let catalog = builtin();
        let charger = catalog.find_product(5).unwrap().to_product();
        assert_eq!(charger.name, "Phone Charger");
        assert_eq!(charger.quantity, 1);
    }

    #[test]
    fn builtin_catalog_packing_scenarios() {
        let catalog = builtin();
        assert_eq!(packed_box_names(&catalog, &[(5, 3)]), ["BOX A"]);
        assert_eq!(packed_box_names(&catalog, &[(5, 3), (3, 1)]), ["BOX B"]);
        assert_eq!(packed_box_names(&catalog, &[(37, 2)]), ["BOX C", "BOX C"]);
        assert_eq!(
            packed_box_names(&catalog, &[(5, 4), (2, 1), (37, 3)]),
            ["BOX C", "BOX C", "BOX C"]
        );
        assert_eq!(packed_box_names(&catalog, &[(5, 4), (2, 4)]), ["BOX D"]);
        assert_eq!(packed_box_names(&catalog, &[(5, 3), (3, 3)]), ["BOX E"]);
    }

    #[test]
    fn every_builtin_product_fits_some_box() {
        let catalog = builtin();
        for product in catalog.products() {
            let result = pack(&[product.to_product()], catalog.boxes());
            assert_eq!(result.box_count(), 1, "{} was not packed", product.name);
        }
    }

    #[test]
    fn rejects_duplicate_box_ids() {
        let boxes = r#"[
            {"id": 1, "name": "A", "length": 1, "width": 1, "height": 1, "weight_limit": 1},
            {"id": 1, "name": "B", "length": 2, "width": 2, "height": 2, "weight_limit": 2}
        ]"#;
        let err = Catalog::from_json("[]", "products", boxes, "boxes").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Invalid {
                source: ValidationError::DuplicateId(1),
                ..
            }
        ));
    }

    #[test]
    fn rejects_invalid_product_record() {
        let products = r#"[{"id": 1, "name": "Flat", "length": 1, "width": 0, "height": 1, "weight": 1}]"#;
        let err = Catalog::from_json(products, "products", BUILTIN_BOXES, "boxes").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Invalid {
                source: ValidationError::InvalidDimension(_),
                ..
            }
        ));
    }

    #[test]
    fn rejects_empty_box_catalog() {
        let err = Catalog::from_json(BUILTIN_PRODUCTS, "products", "[]", "boxes").unwrap_err();
        assert!(matches!(err, CatalogError::NoBoxes(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Catalog::from_json("{", "products", BUILTIN_BOXES, "boxes").unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[test]
    fn loads_boxes_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 9, "name": "Crate", "length": 100, "width": 100, "height": 100, "weight_limit": 500}}]"#
        )
        .unwrap();

        let catalog = Catalog::load(None, Some(file.path())).unwrap();
        assert_eq!(catalog.boxes().len(), 1);
        assert_eq!(catalog.boxes()[0].name, "Crate");
        assert_eq!(catalog.products(), builtin().products());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Catalog::load(Some(Path::new("/nonexistent/products.json")), None).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
