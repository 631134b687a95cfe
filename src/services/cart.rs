use serde::Serialize;

use crate::cart::{CartStorage, CartStore};
use crate::domain::cart::{Cart, CartItem};
use crate::domain::format_cents;
use crate::repository::ProductReader;
use crate::services::{ServiceError, ServiceResult};

/// Cart line as rendered by the cart and checkout templates.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CartLineView {
    pub id: i32,
    pub name: String,
    pub category: &'static str,
    pub size: &'static str,
    pub image: Option<String>,
    pub quantity: i32,
    pub price_formatted: String,
    pub line_total_formatted: String,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            category: item.category.as_str(),
            size: item.size.as_str(),
            image: item.primary_image().map(str::to_string),
            quantity: item.quantity,
            price_formatted: format_cents(item.price_cents),
            line_total_formatted: format_cents(item.line_total_cents()),
        }
    }
}

/// Whole cart with derived totals.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: i64,
    pub subtotal_cents: i64,
    pub subtotal_formatted: String,
    pub total_cents: i64,
    pub total_formatted: String,
    pub is_empty: bool,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items.iter().map(CartLineView::from).collect(),
            item_count: cart.item_count(),
            subtotal_cents: cart.subtotal_cents(),
            subtotal_formatted: format_cents(cart.subtotal_cents()),
            total_cents: cart.total_cents(),
            total_formatted: format_cents(cart.total_cents()),
            is_empty: cart.is_empty(),
        }
    }
}

/// Looks up `product_id` in the catalogue and adds one unit of it.
///
/// The cart line snapshots the product as it is now; later catalogue edits do
/// not reach it. A full cart is reported as [`ServiceError::Form`].
pub fn add_to_cart<R, S>(repo: &R, store: &CartStore<S>, product_id: i32) -> ServiceResult<Cart>
where
    R: ProductReader + ?Sized,
    S: CartStorage,
{
    let product = repo
        .get_product_by_id(product_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    store
        .try_add(&product)
        .map_err(|err| ServiceError::Form(err.to_string()))
}
