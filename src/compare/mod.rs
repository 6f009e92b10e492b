//! Pairwise product comparison
//!
//! Resolves product ids, builds the union of spec keys and flags every row
//! whose values are not all identical. A product that lacks a key contributes
//! [`CellValue::NotApplicable`], which never equals a real value.

use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{Product, SpecCategory};

pub mod spec_table;

pub use spec_table::SpecRow;

/// Id-to-product resolution used by the engine
pub trait ProductLookup {
    fn lookup(&self, id: &str) -> Option<Arc<Product>>;
}

/// Value of one product in one row
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellValue {
    Value(String),
    NotApplicable,
}

impl CellValue {
    pub fn as_str(&self) -> &str {
        match self {
            CellValue::Value(v) => v,
            CellValue::NotApplicable => "N/A",
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, CellValue::Value(_))
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Value(v) => serializer.serialize_str(v),
            CellValue::NotApplicable => serializer.serialize_none(),
        }
    }
}

/// One attribute row of a comparison
#[derive(Debug, Clone, Serialize)]
pub struct AttributeRow {
    pub key: String,
    pub label: String,
    pub category: SpecCategory,
    /// One value per compared product, in product order
    pub values: Vec<CellValue>,
    pub divergent: bool,
}

/// Derived comparison view; recomputed on every request
#[derive(Debug, Clone, Default, Serialize)]
pub struct ComparisonResult {
    #[serde(serialize_with = "serialize_products")]
    pub products: Vec<Arc<Product>>,
    pub rows: Vec<AttributeRow>,
}

fn serialize_products<S: Serializer>(
    products: &[Arc<Product>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(products.iter().map(|p| p.as_ref()))
}

impl ComparisonResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn divergent_rows(&self) -> impl Iterator<Item = &AttributeRow> {
        self.rows.iter().filter(|r| r.divergent)
    }

    pub fn divergent_count(&self) -> usize {
        self.divergent_rows().count()
    }

    pub fn row(&self, key: &str) -> Option<&AttributeRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    /// Value of `product_id` in row `key`
    pub fn value(&self, key: &str, product_id: &str) -> Option<&CellValue> {
        let column = self.products.iter().position(|p| p.id == product_id)?;
        self.row(key).and_then(|r| r.values.get(column))
    }
}

/// Minimum number of resolved products for a non-empty comparison
pub const MIN_COMPARABLE: usize = 2;

/// Comparison engine over a product lookup
pub struct ComparisonEngine<'a, L: ProductLookup + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: ProductLookup + ?Sized> ComparisonEngine<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Compare the products named by `ids`, in order.
    ///
    /// Unknown ids are dropped without aborting the comparison; repeated ids
    /// are compared once.
    pub fn compare<S: AsRef<str>>(&self, ids: &[S]) -> ComparisonResult {
        let mut seen = HashSet::new();
        let products: Vec<Arc<Product>> = ids
            .iter()
            .map(|id| id.as_ref())
            .filter(|id| seen.insert(*id))
            .filter_map(|id| {
                let resolved = self.lookup.lookup(id);
                if resolved.is_none() {
                    tracing::debug!("Dropping unresolved product id {}", id);
                }
                resolved
            })
            .collect();

        compare_products(products)
    }
}

/// Compare already-resolved products.
///
/// Fewer than [`MIN_COMPARABLE`] products yields the products with no rows.
pub fn compare_products(products: Vec<Arc<Product>>) -> ComparisonResult {
    if products.len() < MIN_COMPARABLE {
        return ComparisonResult {
            products,
            rows: Vec::new(),
        };
    }

    let rows = spec_table::normalize(products.iter().map(|p| p.as_ref()))
        .into_iter()
        .map(|header| {
            let values: Vec<CellValue> = products
                .iter()
                .map(|p| match p.spec(&header.key) {
                    Some(spec) => CellValue::Value(spec.value.clone()),
                    None => CellValue::NotApplicable,
                })
                .collect();
            let distinct: HashSet<&CellValue> = values.iter().collect();

            AttributeRow {
                key: header.key,
                label: header.label,
                category: header.category,
                divergent: distinct.len() > 1,
                values,
            }
        })
        .collect();

    ComparisonResult { products, rows }
}
