use std::fmt;

use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

use crate::domain::UnknownVariant;

/// Maximum number of image references kept per product.
pub const MAX_PRODUCT_IMAGES: usize = 3;

/// Fragrance concentration families offered by the store.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductCategory {
    #[serde(rename = "Eau de Parfum")]
    EauDeParfum,
    #[serde(rename = "Eau de Toilette")]
    EauDeToilette,
    #[serde(rename = "Eau de Cologne")]
    EauDeCologne,
    #[serde(rename = "Perfume Oil")]
    PerfumeOil,
}

impl ProductCategory {
    /// Every category in display order.
    pub const ALL: [ProductCategory; 4] = [
        ProductCategory::EauDeParfum,
        ProductCategory::EauDeToilette,
        ProductCategory::EauDeCologne,
        ProductCategory::PerfumeOil,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::EauDeParfum => "Eau de Parfum",
            ProductCategory::EauDeToilette => "Eau de Toilette",
            ProductCategory::EauDeCologne => "Eau de Cologne",
            ProductCategory::PerfumeOil => "Perfume Oil",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProductCategory {
    type Error = UnknownVariant;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        ProductCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownVariant::new("category", trimmed))
    }
}

/// Bottle sizes offered by the store.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProductSize {
    #[serde(rename = "30ml")]
    Ml30,
    #[serde(rename = "50ml")]
    Ml50,
    #[default]
    #[serde(rename = "100ml")]
    Ml100,
    #[serde(rename = "200ml")]
    Ml200,
}

impl ProductSize {
    /// Every size in ascending order.
    pub const ALL: [ProductSize; 4] = [
        ProductSize::Ml30,
        ProductSize::Ml50,
        ProductSize::Ml100,
        ProductSize::Ml200,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductSize::Ml30 => "30ml",
            ProductSize::Ml50 => "50ml",
            ProductSize::Ml100 => "100ml",
            ProductSize::Ml200 => "200ml",
        }
    }
}

impl fmt::Display for ProductSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProductSize {
    type Error = UnknownVariant;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().replace(' ', "").to_ascii_lowercase();
        ProductSize::ALL
            .into_iter()
            .find(|size| size.as_str() == normalized)
            .ok_or_else(|| UnknownVariant::new("size", value.trim()))
    }
}

/// Domain representation of a fragrance listed in the catalogue.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    /// Identifier assigned by the store on creation.
    pub id: i32,
    /// Display name of the fragrance.
    pub name: String,
    /// Concentration family.
    pub category: ProductCategory,
    /// Price represented in the smallest currency unit.
    pub price_cents: i64,
    /// Bottle size.
    pub size: ProductSize,
    /// Ordered image references, at most [`MAX_PRODUCT_IMAGES`].
    pub images: Vec<String>,
    /// Free-form description shown on the product page.
    pub description: String,
    /// Units available for sale.
    pub stock: i32,
    /// Timestamp for when the product record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the product record.
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// First image reference, used wherever a single thumbnail is needed.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// Payload required to insert a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub category: ProductCategory,
    pub price_cents: i64,
    pub size: ProductSize,
    pub images: Vec<String>,
    pub description: String,
    pub stock: i32,
}

impl NewProduct {
    /// Build a product payload with the default size, no images and no stock.
    pub fn new(name: impl Into<String>, category: ProductCategory, price_cents: i64) -> Self {
        Self {
            name: name.into(),
            category,
            price_cents,
            size: ProductSize::default(),
            images: Vec::new(),
            description: String::new(),
            stock: 0,
        }
    }

    pub fn with_size(mut self, size: ProductSize) -> Self {
        self.size = size;
        self
    }

    /// Attach image references; anything past [`MAX_PRODUCT_IMAGES`] is dropped.
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images.into_iter().take(MAX_PRODUCT_IMAGES).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_stock(mut self, stock: i32) -> Self {
        self.stock = stock;
        self
    }
}

/// Patch data applied when updating an existing product.
///
/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub category: Option<ProductCategory>,
    pub price_cents: Option<i64>,
    pub size: Option<ProductSize>,
    pub images: Option<Vec<String>>,
    pub description: Option<String>,
    pub stock: Option<i32>,
    /// Timestamp captured when the patch was created.
    pub updated_at: NaiveDateTime,
}

impl Default for UpdateProduct {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateProduct {
    /// Create a new patch object with no changes applied yet.
    pub fn new() -> Self {
        let now = chrono::Local::now().naive_utc();
        Self {
            name: None,
            category: None,
            price_cents: None,
            size: None,
            images: None,
            description: None,
            stock: None,
            updated_at: now,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn category(mut self, category: ProductCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn price_cents(mut self, price_cents: i64) -> Self {
        self.price_cents = Some(price_cents);
        self
    }

    pub fn size(mut self, size: ProductSize) -> Self {
        self.size = Some(size);
        self
    }

    /// Replace the image list; anything past [`MAX_PRODUCT_IMAGES`] is dropped.
    pub fn images(mut self, images: Vec<String>) -> Self {
        self.images = Some(images.into_iter().take(MAX_PRODUCT_IMAGES).collect());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn stock(mut self, stock: i32) -> Self {
        self.stock = Some(stock);
        self
    }
}

/// Ordering applied to catalogue listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum ProductSort {
    /// Insertion order, oldest first.
    #[default]
    #[serde(rename = "featured")]
    Featured,
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "price-low")]
    PriceLow,
    #[serde(rename = "price-high")]
    PriceHigh,
}

/// Query definition used to list products.
#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    /// Optional category filter.
    pub category: Option<ProductCategory>,
    /// Optional name or description search term.
    pub search: Option<String>,
    /// Ordering of the result set.
    pub sort: ProductSort,
    /// Optional pagination options applied to the query.
    pub pagination: Option<Pagination>,
}

impl ProductListQuery {
    /// Construct a query that targets the whole catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: ProductCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Filter the results by a search term applied to the name or description.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(
            ProductCategory::try_from(" eau de parfum "),
            Ok(ProductCategory::EauDeParfum)
        );
        assert!(ProductCategory::try_from("Body Mist").is_err());
    }

    #[test]
    fn size_accepts_spaced_input() {
        assert_eq!(ProductSize::try_from("50 ML"), Ok(ProductSize::Ml50));
        assert!(ProductSize::try_from("75ml").is_err());
    }

    #[test]
    fn builders_cap_image_list() {
        let images = vec!["a".to_string(), "b".into(), "c".into(), "d".into()];
        let product = NewProduct::new("Oud", ProductCategory::PerfumeOil, 100).with_images(images);
        assert_eq!(product.images, vec!["a", "b", "c"]);

        let patch = UpdateProduct::new().images(vec!["x".into(); 5]);
        assert_eq!(patch.images.map(|images| images.len()), Some(3));
    }

    #[test]
    fn category_serializes_as_display_name() {
        let json = serde_json::to_string(&ProductCategory::EauDeCologne).unwrap();
        assert_eq!(json, "\"Eau de Cologne\"");
    }
}
