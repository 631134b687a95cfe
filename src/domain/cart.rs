use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductCategory, ProductSize};

/// Most units of one product a single cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// One product line in a shopper's cart: a compact snapshot of the product
/// plus a quantity.
///
/// Only what the cart and checkout need is kept: the description and every
/// image but the first stay in the catalogue.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CartItem {
    /// Product identifier, unique within a cart.
    pub id: i32,
    pub name: String,
    pub category: ProductCategory,
    /// Unit price in the smallest currency unit.
    pub price_cents: i64,
    #[serde(default)]
    pub size: ProductSize,
    /// The primary image, when the product has one.
    #[serde(default)]
    pub images: Vec<String>,
    pub quantity: i32,
    /// Singular image field written by older clients; folded into `images` on read.
    #[serde(rename = "image", default, skip_serializing)]
    legacy_image: Option<String>,
}

impl CartItem {
    /// Snapshot `product` as a new line with quantity 1.
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            category: product.category,
            price_cents: product.price_cents,
            size: product.size,
            images: product.primary_image().map(str::to_string).into_iter().collect(),
            quantity: 1,
            legacy_image: None,
        }
    }

    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn line_total_cents(&self) -> i64 {
        self.price_cents * i64::from(self.quantity)
    }

    /// Bring a stored line back to the current shape: fold the legacy image
    /// in, keep one image and a quantity within `1..=MAX_LINE_QUANTITY`.
    pub(crate) fn normalize(mut self) -> Self {
        match self.legacy_image.take() {
            Some(image) if self.images.is_empty() && !image.is_empty() => {
                self.images.push(image);
            }
            _ => {}
        }
        self.images.truncate(1);
        self.quantity = self.quantity.clamp(1, MAX_LINE_QUANTITY);
        self
    }
}

/// Ordered list of cart lines owned by a single visitor.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price × quantity` over every line.
    pub fn subtotal_cents(&self) -> i64 {
        self.items.iter().map(CartItem::line_total_cents).sum()
    }

    /// Amount charged at checkout; no tax or shipping is added.
    pub fn total_cents(&self) -> i64 {
        self.subtotal_cents()
    }

    /// Number of units across all lines, shown on the header badge.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    pub fn get(&self, product_id: i32) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == product_id)
    }
}
