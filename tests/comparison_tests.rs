// Integration tests for selection and attribute comparison

use anyhow::Result;
use duplex::catalog::Catalog;
use duplex::compare::{CellValue, ComparisonEngine};
use duplex::models::{Product, ProductCategory, ProductSpec, SpecCategory};
use duplex::selection::{AddOutcome, Selection};
use std::sync::Arc;

fn product(id: &str, specs: &[(&str, &str)]) -> Product {
    let mut product = Product::new(id, format!("Product {}", id), ProductCategory::Laptop);
    for (key, value) in specs {
        product = product.with_spec(ProductSpec::new(*key, *key, *value, SpecCategory::Basic));
    }
    product
}

fn catalog(products: Vec<Product>) -> Catalog {
    Catalog::new(products)
}

#[test]
fn test_selection_keeps_first_four() -> Result<()> {
    let mut selection = Selection::new(4);
    let ids = ["a", "b", "c", "d", "e"];
    let outcomes: Vec<AddOutcome> = ids
        .iter()
        .map(|id| selection.add(Arc::new(product(id, &[]))))
        .collect();

    assert_eq!(outcomes[4], AddOutcome::AtCapacity);
    assert_eq!(selection.ids(), vec!["a", "b", "c", "d"]);

    assert_eq!(
        selection.add(Arc::new(product("a", &[]))),
        AddOutcome::AlreadySelected
    );
    assert_eq!(selection.len(), 4);
    Ok(())
}

#[test]
fn test_divergence_follows_distinct_values() -> Result<()> {
    let same = catalog(vec![product("1", &[("x", "A")]), product("2", &[("x", "A")])]);
    let result = ComparisonEngine::new(&same).compare(&["1", "2"]);
    assert_eq!(result.rows.len(), 1);
    assert!(!result.rows[0].divergent);

    let different = catalog(vec![
        product("1", &[("x", "A")]),
        product("2", &[("x", "B")]),
        product("3", &[("y", "C")]),
    ]);
    let result = ComparisonEngine::new(&different).compare(&["1", "2"]);
    assert!(result.row("x").unwrap().divergent);

    let same_plus_missing = catalog(vec![
        product("1", &[("x", "A")]),
        product("2", &[("x", "A")]),
        product("3", &[("y", "C")]),
    ]);
    let result = ComparisonEngine::new(&same_plus_missing).compare(&["1", "2", "3"]);
    assert_eq!(result.value("x", "3"), Some(&CellValue::NotApplicable));
    assert!(result.row("x").unwrap().divergent);
    assert_eq!(result.rows.len(), 2);
    Ok(())
}

#[test]
fn test_unknown_ids_are_dropped() -> Result<()> {
    let catalog = catalog(vec![
        product("1", &[("x", "A"), ("z", "1")]),
        product("2", &[("y", "B"), ("x", "A")]),
    ]);
    let engine = ComparisonEngine::new(&catalog);

    let with_stale = engine.compare(&["1", "nonexistent", "2"]);
    let clean = engine.compare(&["1", "2"]);

    let keys = |r: &duplex::compare::ComparisonResult| -> Vec<String> {
        r.rows.iter().map(|row| row.key.clone()).collect()
    };
    assert_eq!(keys(&with_stale), keys(&clean));
    assert_eq!(keys(&clean), vec!["x", "z", "y"]);
    assert_eq!(with_stale.products.len(), 2);
    for (a, b) in with_stale.rows.iter().zip(&clean.rows) {
        assert_eq!(a.values, b.values);
        assert_eq!(a.divergent, b.divergent);
    }
    Ok(())
}

#[test]
fn test_single_product_has_no_rows() -> Result<()> {
    let catalog = catalog(vec![product("1", &[("x", "A")])]);
    let result = ComparisonEngine::new(&catalog).compare(&["1", "missing"]);
    assert!(result.is_empty());
    assert_eq!(result.products.len(), 1);
    Ok(())
}

#[test]
fn test_builtin_phones_compare() -> Result<()> {
    let catalog = Catalog::builtin()?;
    let mut selection = Selection::default();
    selection.add(catalog.get("iphone-15-pro").unwrap());
    selection.add(catalog.get("galaxy-s24-ultra").unwrap());

    let result = selection.compare();
    assert_eq!(result.products[0].id, "iphone-15-pro");
    assert!(result.divergent_count() > 0);

    let json = serde_json::to_value(&result)?;
    assert_eq!(json["products"].as_array().unwrap().len(), 2);
    Ok(())
}
