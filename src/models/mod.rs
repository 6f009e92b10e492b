//! Data models for the product catalog
//!
//! Products are immutable once loaded; everything that compares them works on
//! shared `Arc<Product>` handles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Product category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Smartphone,
    Laptop,
    Tablet,
    Camera,
    Headphone,
    Smartwatch,
    Gaming,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 7] = [
        ProductCategory::Smartphone,
        ProductCategory::Laptop,
        ProductCategory::Tablet,
        ProductCategory::Camera,
        ProductCategory::Headphone,
        ProductCategory::Smartwatch,
        ProductCategory::Gaming,
    ];

    /// Display metadata for the category
    pub fn info(&self) -> CategoryInfo {
        let (name, icon, description) = match self {
            ProductCategory::Smartphone => ("Smartphones", "📱", "Mobile phones and smartphones"),
            ProductCategory::Laptop => ("Laptops", "💻", "Portable computers and laptops"),
            ProductCategory::Tablet => ("Tablets", "📱", "Tablet computers and iPads"),
            ProductCategory::Camera => ("Cameras", "📷", "Digital cameras and camcorders"),
            ProductCategory::Headphone => ("Headphones", "🎧", "Headphones and earphones"),
            ProductCategory::Smartwatch => {
                ("Smart Watches", "⌚", "Smart watches and fitness trackers")
            }
            ProductCategory::Gaming => ("Gaming", "🎮", "Gaming consoles and accessories"),
        };
        CategoryInfo {
            id: *self,
            name: name.to_string(),
            icon: icon.to_string(),
            description: description.to_string(),
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductCategory::Smartphone => write!(f, "smartphone"),
            ProductCategory::Laptop => write!(f, "laptop"),
            ProductCategory::Tablet => write!(f, "tablet"),
            ProductCategory::Camera => write!(f, "camera"),
            ProductCategory::Headphone => write!(f, "headphone"),
            ProductCategory::Smartwatch => write!(f, "smartwatch"),
            ProductCategory::Gaming => write!(f, "gaming"),
        }
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "smartphone" => Ok(ProductCategory::Smartphone),
            "laptop" => Ok(ProductCategory::Laptop),
            "tablet" => Ok(ProductCategory::Tablet),
            "camera" => Ok(ProductCategory::Camera),
            "headphone" => Ok(ProductCategory::Headphone),
            "smartwatch" => Ok(ProductCategory::Smartwatch),
            "gaming" => Ok(ProductCategory::Gaming),
            _ => Err(format!(
                "Invalid category: {}. Use: smartphone, laptop, tablet, camera, headphone, smartwatch, gaming",
                s
            )),
        }
    }
}

/// Display metadata for a product category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub id: ProductCategory,
    pub name: String,
    pub icon: String,
    pub description: String,
}

/// Grouping of spec rows in a comparison table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpecCategory {
    Basic,
    Performance,
    Display,
    Camera,
    Battery,
    Connectivity,
    #[default]
    Other,
}

impl SpecCategory {
    /// Position of the group when rows are shown grouped
    pub fn order(&self) -> u8 {
        match self {
            SpecCategory::Basic => 1,
            SpecCategory::Performance => 2,
            SpecCategory::Display => 3,
            SpecCategory::Camera => 4,
            SpecCategory::Battery => 5,
            SpecCategory::Connectivity => 6,
            SpecCategory::Other => 7,
        }
    }
}

impl std::fmt::Display for SpecCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecCategory::Basic => write!(f, "Basic Info"),
            SpecCategory::Performance => write!(f, "Performance"),
            SpecCategory::Display => write!(f, "Display"),
            SpecCategory::Camera => write!(f, "Camera"),
            SpecCategory::Battery => write!(f, "Battery"),
            SpecCategory::Connectivity => write!(f, "Connectivity"),
            SpecCategory::Other => write!(f, "Other"),
        }
    }
}

/// A single product attribute. `key` is unique within one product and means
/// the same thing across products.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductSpec {
    pub key: String,
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub category: SpecCategory,
}

impl ProductSpec {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        value: impl Into<String>,
        category: SpecCategory,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            value: value.into(),
            category,
        }
    }
}

/// A catalog product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: ProductCategory,
    pub price: f64,
    pub currency: String,
    /// Ranking score, 1-100
    pub popularity: u8,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub specs: Vec<ProductSpec>,
}

impl Product {
    /// Create a product with no specs and placeholder metadata
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: ProductCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: String::new(),
            category,
            price: 0.0,
            currency: "USD".to_string(),
            popularity: 1,
            release_date: NaiveDate::default(),
            description: String::new(),
            specs: Vec::new(),
        }
    }

    pub fn with_spec(mut self, spec: ProductSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Look up one attribute by key
    pub fn spec(&self, key: &str) -> Option<&ProductSpec> {
        self.specs.iter().find(|s| s.key == key)
    }

    /// Case-insensitive substring match used by catalog search
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q)
            || self.brand.to_lowercase().contains(&q)
            || self.description.to_lowercase().contains(&q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in ProductCategory::ALL {
            let parsed: ProductCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("toaster".parse::<ProductCategory>().is_err());
    }

    #[test]
    fn test_matches_query_is_case_insensitive() {
        let mut product = Product::new("p1", "Galaxy S24 Ultra", ProductCategory::Smartphone);
        product.brand = "Samsung".to_string();
        assert!(product.matches_query("galaxy"));
        assert!(product.matches_query("SAMSUNG"));
        assert!(!product.matches_query("pixel"));
    }

    #[test]
    fn test_spec_lookup() {
        let product = Product::new("p1", "Phone", ProductCategory::Smartphone)
            .with_spec(ProductSpec::new("os", "Operating System", "iOS 17", SpecCategory::Basic));
        assert_eq!(product.spec("os").map(|s| s.value.as_str()), Some("iOS 17"));
        assert!(product.spec("weight").is_none());
    }
}
