//! Back-office dashboard figures.
//!
//! The figures are computed over in-memory snapshots held by [`LiveCatalog`],
//! which stays subscribed to the product and order feeds for the lifetime of
//! the server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{Duration, NaiveDateTime};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::repository::errors::RepositoryError;
use pushkind_common::routes::check_role;
use serde::Serialize;

use crate::SERVICE_ACCESS_ROLE;
use crate::domain::format_cents;
use crate::domain::order::Order;
use crate::domain::product::Product;
use crate::repository::feed::Subscription;
use crate::repository::{OrderFeed, ProductFeed};
use crate::services::orders::OrderView;
use crate::services::{ServiceError, ServiceResult};

/// Window used by the headline figures.
pub const STATS_WINDOW_DAYS: i64 = 30;
/// Products above this stock level count as "in stock".
pub const LOW_STOCK_THRESHOLD: i32 = 10;
pub const TOP_PRODUCTS_LIMIT: usize = 5;
pub const RECENT_ORDERS_LIMIT: usize = 5;

/// Headline figures over the last [`STATS_WINDOW_DAYS`] days.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct DashboardStats {
    pub revenue_cents: i64,
    pub revenue_formatted: String,
    pub order_count: usize,
    pub products_sold: i64,
    /// Every order counts as a new customer.
    pub new_customers: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TopProduct {
    pub product_id: i32,
    pub name: String,
    pub image: Option<String>,
    pub quantity: i64,
    pub revenue_cents: i64,
    pub revenue_formatted: String,
}

/// Share of the catalogue per stock bucket, rounded to whole percents.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct InventoryStatus {
    pub total: usize,
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub in_stock_percent: u32,
    pub low_stock_percent: u32,
    pub out_of_stock_percent: u32,
}

/// Data required to render the dashboard template.
#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub top_products: Vec<TopProduct>,
    pub recent_orders: Vec<OrderView>,
    pub inventory: InventoryStatus,
    /// Feeds whose first snapshot could not be loaded.
    pub load_errors: Vec<String>,
}

pub fn compute_stats(orders: &[Order], now: NaiveDateTime) -> DashboardStats {
    let since = now - Duration::days(STATS_WINDOW_DAYS);
    let recent: Vec<&Order> = orders
        .iter()
        .filter(|order| order.created_at > since)
        .collect();

    let revenue_cents = recent.iter().map(|order| order.total_cents).sum();

    DashboardStats {
        revenue_cents,
        revenue_formatted: format_cents(revenue_cents),
        order_count: recent.len(),
        products_sold: recent.iter().map(|order| order.item_count()).sum(),
        new_customers: recent.len(),
    }
}

/// Best sellers by revenue across every order.
///
/// Names and images come from the live catalogue when the product still
/// exists, otherwise from the order line snapshot.
pub fn top_products(orders: &[Order], products: &[Product], limit: usize) -> Vec<TopProduct> {
    let catalogue: HashMap<i32, &Product> = products.iter().map(|p| (p.id, p)).collect();
    let mut sales: HashMap<i32, TopProduct> = HashMap::new();

    for item in orders.iter().flat_map(|order| order.items.iter()) {
        let entry = sales.entry(item.product_id).or_insert_with(|| {
            let product = catalogue.get(&item.product_id);
            TopProduct {
                product_id: item.product_id,
                name: product
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| item.name.clone()),
                image: product
                    .and_then(|p| p.primary_image())
                    .map(str::to_string)
                    .or_else(|| item.image.clone()),
                quantity: 0,
                revenue_cents: 0,
                revenue_formatted: String::new(),
            }
        });
        entry.quantity += i64::from(item.quantity);
        entry.revenue_cents += item.line_total_cents();
    }

    let mut ranked: Vec<TopProduct> = sales.into_values().collect();
    ranked.sort_by(|a, b| {
        b.revenue_cents
            .cmp(&a.revenue_cents)
            .then(a.product_id.cmp(&b.product_id))
    });
    ranked.truncate(limit);

    for product in &mut ranked {
        product.revenue_formatted = format_cents(product.revenue_cents);
    }

    ranked
}

fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

pub fn inventory_status(products: &[Product]) -> InventoryStatus {
    let total = products.len();
    let out_of_stock = products.iter().filter(|p| p.stock <= 0).count();
    let low_stock = products
        .iter()
        .filter(|p| p.stock > 0 && p.stock <= LOW_STOCK_THRESHOLD)
        .count();
    let in_stock = total - out_of_stock - low_stock;

    InventoryStatus {
        total,
        in_stock,
        low_stock,
        out_of_stock,
        in_stock_percent: percent(in_stock, total),
        low_stock_percent: percent(low_stock, total),
        out_of_stock_percent: percent(out_of_stock, total),
    }
}

/// Products and orders kept current by the repository feeds.
pub struct LiveCatalog {
    products: Arc<RwLock<Vec<Product>>>,
    orders: Arc<RwLock<Vec<Order>>>,
    errors: Arc<Mutex<Vec<String>>>,
    _subscriptions: Vec<Subscription>,
}

impl LiveCatalog {
    /// Subscribe to both feeds. A feed that fails to load stays empty and
    /// is reported once through [`LiveCatalog::take_load_errors`].
    pub fn start<R>(repo: &R) -> Self
    where
        R: ProductFeed + OrderFeed + ?Sized,
    {
        let products = Arc::new(RwLock::new(Vec::new()));
        let orders = Arc::new(RwLock::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));

        let product_sink = Arc::clone(&products);
        let product_errors = Arc::clone(&errors);
        let products_subscription = repo.subscribe_products(
            Box::new(move |snapshot: &[Product]| store_snapshot(&product_sink, snapshot)),
            Box::new(move |err: RepositoryError| {
                log::error!("Failed to load products: {err}");
                record_error(&product_errors, "Failed to load products");
            }),
        );

        let order_sink = Arc::clone(&orders);
        let order_errors = Arc::clone(&errors);
        let orders_subscription = repo.subscribe_orders(
            Box::new(move |snapshot: &[Order]| store_snapshot(&order_sink, snapshot)),
            Box::new(move |err: RepositoryError| {
                log::error!("Failed to load orders: {err}");
                record_error(&order_errors, "Failed to load orders");
            }),
        );

        Self {
            products,
            orders,
            errors,
            _subscriptions: vec![products_subscription, orders_subscription],
        }
    }

    pub fn products(&self) -> Vec<Product> {
        read_snapshot(&self.products)
    }

    /// Orders, newest first.
    pub fn orders(&self) -> Vec<Order> {
        read_snapshot(&self.orders)
    }

    /// Drains the pending load errors so each one is shown once.
    pub fn take_load_errors(&self) -> Vec<String> {
        match self.errors.lock() {
            Ok(mut errors) => std::mem::take(&mut *errors),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

fn store_snapshot<T: Clone>(target: &RwLock<Vec<T>>, snapshot: &[T]) {
    match target.write() {
        Ok(mut current) => *current = snapshot.to_vec(),
        Err(poisoned) => *poisoned.into_inner() = snapshot.to_vec(),
    }
}

fn read_snapshot<T: Clone>(source: &RwLock<Vec<T>>) -> Vec<T> {
    match source.read() {
        Ok(current) => current.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn record_error(errors: &Mutex<Vec<String>>, message: &str) {
    match errors.lock() {
        Ok(mut errors) => errors.push(message.to_string()),
        Err(poisoned) => poisoned.into_inner().push(message.to_string()),
    }
}

/// Assembles every dashboard widget from the live snapshots.
pub fn load_dashboard(
    live: &LiveCatalog,
    user: &AuthenticatedUser,
    now: NaiveDateTime,
) -> ServiceResult<DashboardData> {
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let orders = live.orders();
    let products = live.products();

    Ok(DashboardData {
        stats: compute_stats(&orders, now),
        top_products: top_products(&orders, &products, TOP_PRODUCTS_LIMIT),
        inventory: inventory_status(&products),
        recent_orders: orders
            .into_iter()
            .take(RECENT_ORDERS_LIMIT)
            .map(OrderView::from)
            .collect(),
        load_errors: live.take_load_errors(),
    })
}
