//! Product catalog
//!
//! Products are fixed-shape, validated records; the catalog keeps them in the
//! order they were added, which is the order every report follows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::inflation::Period;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("product name is blank")]
    BlankName,

    #[error("product '{name}' has negative base price {price}")]
    NegativePrice { name: String, price: Decimal },

    #[error("duplicate product '{0}'")]
    DuplicateProduct(String),

    #[error("unknown product '{0}'")]
    UnknownProduct(String),
}

/// Raw product fields as they arrive from an importer or a JSON backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub base_price: Decimal,
    pub base_period: Period,
    #[serde(default)]
    pub category: Option<String>,
}

/// A product whose price is projected forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProductRecord", into = "ProductRecord")]
pub struct Product {
    name: String,
    base_price: Decimal,
    base_period: Period,
    category: Option<String>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        base_price: Decimal,
        base_period: Period,
        category: Option<String>,
    ) -> Result<Self, CatalogError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::BlankName);
        }
        if base_price < Decimal::ZERO {
            return Err(CatalogError::NegativePrice {
                name,
                price: base_price,
            });
        }

        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        Ok(Self {
            name,
            base_price,
            base_period,
            category,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_price(&self) -> Decimal {
        self.base_price
    }

    pub fn base_period(&self) -> Period {
        self.base_period
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

impl TryFrom<ProductRecord> for Product {
    type Error = CatalogError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        Product::new(
            record.name,
            record.base_price,
            record.base_period,
            record.category,
        )
    }
}

impl From<Product> for ProductRecord {
    fn from(product: Product) -> Self {
        ProductRecord {
            name: product.name,
            base_price: product.base_price,
            base_period: product.base_period,
            category: product.category,
        }
    }
}

/// Insertion-ordered set of products with unique names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Product>", into = "Vec<Product>")]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_products<I>(products: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = Product>,
    {
        let mut catalog = Self::new();
        for product in products {
            catalog.add(product)?;
        }
        Ok(catalog)
    }

    pub fn add(&mut self, product: Product) -> Result<(), CatalogError> {
        if self.position(product.name()).is_some() {
            return Err(CatalogError::DuplicateProduct(product.name().to_string()));
        }
        self.products.push(product);
        Ok(())
    }

    /// Replace the product called `name`, keeping its position.
    ///
    /// The replacement may be renamed, as long as the new name is not taken by
    /// another product.
    pub fn update(&mut self, name: &str, product: Product) -> Result<(), CatalogError> {
        let idx = self
            .position(name)
            .ok_or_else(|| CatalogError::UnknownProduct(name.to_string()))?;

        if let Some(other) = self.position(product.name()) {
            if other != idx {
                return Err(CatalogError::DuplicateProduct(product.name().to_string()));
            }
        }

        self.products[idx] = product;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Product> {
        self.position(name).map(|idx| self.products.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Earliest base period across all products
    pub fn earliest_base_period(&self) -> Option<Period> {
        self.products.iter().map(Product::base_period).min()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.products.iter().position(|p| p.name() == name)
    }
}

impl TryFrom<Vec<Product>> for Catalog {
    type Error = CatalogError;

    fn try_from(products: Vec<Product>) -> Result<Self, Self::Error> {
        Catalog::from_products(products)
    }
}

impl From<Catalog> for Vec<Product> {
    fn from(catalog: Catalog) -> Self {
        catalog.products
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(name: &str, price: Decimal) -> Product {
        Product::new(name, price, Period(0), None).unwrap()
    }

    #[test]
    fn test_product_validation() {
        assert_eq!(
            Product::new("   ", dec!(1), Period(0), None).unwrap_err(),
            CatalogError::BlankName
        );
        assert_eq!(
            Product::new("Tea", dec!(-0.01), Period(0), None).unwrap_err(),
            CatalogError::NegativePrice {
                name: "Tea".to_string(),
                price: dec!(-0.01)
            }
        );

        let p = Product::new("  Tea ", dec!(0), Period(3), Some(" ".to_string())).unwrap();
        assert_eq!(p.name(), "Tea");
        assert_eq!(p.base_price(), dec!(0));
        assert_eq!(p.base_period(), Period(3));
        assert_eq!(p.category(), None);
    }

    #[test]
    fn test_catalog_keeps_insertion_order() {
        let catalog = Catalog::from_products(vec![
            product("Zucchini", dec!(2)),
            product("Apple", dec!(1)),
            product("Milk", dec!(3)),
        ])
        .unwrap();

        let names: Vec<&str> = catalog.iter().map(Product::name).collect();
        assert_eq!(names, vec!["Zucchini", "Apple", "Milk"]);
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let mut catalog = Catalog::new();
        catalog.add(product("Apple", dec!(1))).unwrap();
        assert_eq!(
            catalog.add(product("Apple", dec!(2))).unwrap_err(),
            CatalogError::DuplicateProduct("Apple".to_string())
        );
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_update_and_remove() {
        let mut catalog =
            Catalog::from_products(vec![product("A", dec!(1)), product("B", dec!(2))]).unwrap();

        catalog.update("A", product("A2", dec!(10))).unwrap();
        let names: Vec<&str> = catalog.iter().map(Product::name).collect();
        assert_eq!(names, vec!["A2", "B"]);

        assert_eq!(
            catalog.update("A2", product("B", dec!(1))).unwrap_err(),
            CatalogError::DuplicateProduct("B".to_string())
        );
        assert_eq!(
            catalog.update("missing", product("C", dec!(1))).unwrap_err(),
            CatalogError::UnknownProduct("missing".to_string())
        );

        assert_eq!(catalog.remove("B").map(|p| p.base_price()), Some(dec!(2)));
        assert!(catalog.remove("B").is_none());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_json_backup_is_validated() {
        let catalog = Catalog::from_products(vec![product("A", dec!(1.5))]).unwrap();
        let json = serde_json::to_string(&catalog).unwrap();
        let restored: Catalog = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, catalog);

        let bad = r#"[{"name":"A","base_price":"-1","base_period":0}]"#;
        assert!(serde_json::from_str::<Catalog>(bad).is_err());

        let dup = r#"[{"name":"A","base_price":"1","base_period":0},{"name":"A","base_price":"2","base_period":0}]"#;
        assert!(serde_json::from_str::<Catalog>(dup).is_err());
    }
}
