use std::sync::Arc;

use pushkind_common::db::{DbConnection, DbPool};
use pushkind_common::pagination::Pagination;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::domain::order::{NewOrder, Order, OrderListQuery, OrderStatus};
use crate::domain::product::{NewProduct, Product, ProductListQuery, UpdateProduct};
use crate::repository::feed::{ChangeFeed, Subscription};

pub mod feed;
pub mod order;
pub mod product;

#[cfg(test)]
pub mod mock;

/// Listener receiving the full product list after every change.
pub type ProductListener = Box<dyn Fn(&[Product]) + Send + Sync>;
/// Listener receiving the full order list, newest first, after every change.
pub type OrderListener = Box<dyn Fn(&[Order]) + Send + Sync>;
/// Called at most once when a subscription cannot deliver its first snapshot.
pub type FeedErrorHandler = Box<dyn FnOnce(RepositoryError) + Send>;

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
///
/// Clones share the pool and the change feeds, so a write through any clone
/// reaches every subscriber.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
    products_feed: Arc<ChangeFeed<Product>>,
    orders_feed: Arc<ChangeFeed<Order>>,
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            products_feed: ChangeFeed::new(),
            orders_feed: ChangeFeed::new(),
        }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations over product records.
pub trait ProductReader {
    fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>>;
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
}

/// Write operations over product records.
pub trait ProductWriter {
    fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
    /// Insert every product or none of them; subscribers are notified once.
    fn create_products(&self, new_products: &[NewProduct]) -> RepositoryResult<Vec<Product>>;
    fn update_product(&self, product_id: i32, updates: &UpdateProduct)
    -> RepositoryResult<Product>;
    fn delete_product(&self, product_id: i32) -> RepositoryResult<()>;
}

/// Push-style reads over the whole product collection.
pub trait ProductFeed {
    /// Deliver the current products now and again after every write.
    ///
    /// When the first snapshot cannot be loaded `on_error` runs once and the
    /// returned guard is detached.
    fn subscribe_products(
        &self,
        on_data: ProductListener,
        on_error: FeedErrorHandler,
    ) -> Subscription;
}

/// Read-only operations over order records.
pub trait OrderReader {
    fn get_order_by_id(&self, id: i32) -> RepositoryResult<Option<Order>>;
    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)>;
}

/// Write operations over order records.
pub trait OrderWriter {
    /// Store a new order as pending.
    fn create_order(&self, new_order: &NewOrder) -> RepositoryResult<Order>;
    /// Overwrite the status of an order and nothing else.
    fn update_order_status(&self, order_id: i32, status: OrderStatus) -> RepositoryResult<Order>;
}

/// Push-style reads over the whole order collection, newest first.
pub trait OrderFeed {
    fn subscribe_orders(&self, on_data: OrderListener, on_error: FeedErrorHandler)
    -> Subscription;
}

/// Shared subscribe logic: the listener is attached and handed its first
/// snapshot before any write can publish to it.
fn subscribe_with_snapshot<T, L>(
    feed: &Arc<ChangeFeed<T>>,
    load: L,
    on_data: Box<dyn Fn(&[T]) + Send + Sync>,
    on_error: FeedErrorHandler,
) -> Subscription
where
    T: 'static,
    L: FnOnce() -> RepositoryResult<Vec<T>>,
{
    match feed.subscribe_with(move |snapshot: &[T]| on_data(snapshot), load) {
        Ok(subscription) => subscription,
        Err(err) => {
            on_error(err);
            Subscription::detached()
        }
    }
}

/// `(offset, limit)` of a 1-based page. Page numbers past any real catalogue
/// saturate instead of overflowing and simply yield an empty page.
fn page_bounds(pagination: &Pagination) -> (i64, i64) {
    let rows_before = pagination
        .page
        .max(1)
        .saturating_sub(1)
        .saturating_mul(pagination.per_page);

    (
        i64::try_from(rows_before).unwrap_or(i64::MAX),
        i64::try_from(pagination.per_page).unwrap_or(i64::MAX),
    )
}
