//! Uniform key/label table over heterogeneous product specs

use indexmap::IndexMap;
use serde::Serialize;

use crate::models::{Product, SpecCategory};

/// One row header of a spec table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecRow {
    pub key: String,
    pub label: String,
    pub category: SpecCategory,
}

/// Union of spec keys across `products`, in first-seen order.
///
/// The label and category come from whichever product defines the key first.
pub fn normalize<'a, I>(products: I) -> Vec<SpecRow>
where
    I: IntoIterator<Item = &'a Product>,
{
    let mut rows: IndexMap<&str, SpecRow> = IndexMap::new();
    for product in products {
        for spec in &product.specs {
            rows.entry(spec.key.as_str()).or_insert_with(|| SpecRow {
                key: spec.key.clone(),
                label: spec.label.clone(),
                category: spec.category,
            });
        }
    }
    rows.into_values().collect()
}

/// A single product's own spec list, in its declared order
pub fn rows_of(product: &Product) -> Vec<SpecRow> {
    normalize(std::iter::once(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProductCategory, ProductSpec};

    fn product(id: &str, specs: &[(&str, &str)]) -> Product {
        specs.iter().fold(
            Product::new(id, id, ProductCategory::Laptop),
            |p, (key, label)| {
                p.with_spec(ProductSpec::new(*key, *label, "v", SpecCategory::Basic))
            },
        )
    }

    #[test]
    fn test_union_keeps_first_seen_order() {
        let a = product("a", &[("cpu", "Processor"), ("ram", "Memory")]);
        let b = product("b", &[("gpu", "Graphics"), ("cpu", "CPU")]);

        let keys: Vec<_> = normalize([&a, &b]).into_iter().map(|r| r.key).collect();
        assert_eq!(keys, vec!["cpu", "ram", "gpu"]);
    }

    #[test]
    fn test_label_from_first_defining_product() {
        let a = product("a", &[("ram", "Memory")]);
        let b = product("b", &[("cpu", "CPU"), ("ram", "RAM")]);

        let rows = normalize([&b, &a]);
        assert_eq!(rows[0].label, "CPU");
        assert_eq!(rows[1].label, "RAM");
    }

    #[test]
    fn test_rows_of_single_product() {
        let a = product("a", &[("weight", "Weight"), ("os", "OS")]);
        let rows = rows_of(&a);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "weight");
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize(std::iter::empty::<&Product>()).is_empty());
    }
}
