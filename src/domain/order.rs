use std::fmt;

use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

use crate::domain::UnknownVariant;
use crate::domain::cart::Cart;

/// Payment method label recorded on orders placed through the storefront.
pub const DEFAULT_PAYMENT_METHOD: &str = "credit_card";

/// Possible lifecycle states for an order.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order has been placed and awaits processing.
    #[default]
    Pending,
    /// Order is being prepared.
    Processing,
    /// Order has left the warehouse.
    Shipped,
    /// Order reached the customer.
    Delivered,
    /// Order has been cancelled.
    Cancelled,
}

impl OrderStatus {
    /// Every status in the order the back-office lists them.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Capitalised label used by the templates.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Whether an order in this status may be moved to `next`.
    ///
    /// Staying in the same status is always allowed. Delivered orders are final
    /// and cancelled orders can only be reopened as pending.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        if *self == next {
            return true;
        }

        match self {
            Pending | Processing => true,
            Shipped => matches!(next, Processing | Delivered | Cancelled),
            Delivered => false,
            Cancelled => next == Pending,
        }
    }

    /// Statuses reachable from this one, excluding itself.
    pub fn allowed_transitions(&self) -> Vec<OrderStatus> {
        OrderStatus::ALL
            .into_iter()
            .filter(|next| next != self && self.can_transition_to(*next))
            .collect()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<OrderStatus> for &'static str {
    fn from(value: OrderStatus) -> Self {
        value.as_str()
    }
}

impl From<OrderStatus> for String {
    fn from(value: OrderStatus) -> Self {
        value.as_str().to_string()
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = UnknownVariant;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| UnknownVariant::new("order status", value.trim()))
    }
}

/// Shipping details captured at checkout and frozen on the order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub phone: String,
    pub email: Option<String>,
    /// Whether the shopper asked to remember these details.
    pub save_info: bool,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Snapshot of a purchased product; never a live reference to the catalogue.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderItem {
    pub product_id: i32,
    pub name: String,
    /// Unit price at the time of purchase in the smallest currency unit.
    pub price_cents: i64,
    pub quantity: i32,
    pub image: Option<String>,
}

impl OrderItem {
    pub fn line_total_cents(&self) -> i64 {
        self.price_cents * i64::from(self.quantity)
    }
}

/// Domain representation of a placed order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Order {
    /// Identifier assigned by the store on creation.
    pub id: i32,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    /// Current lifecycle status of the order.
    pub status: OrderStatus,
    pub payment_method: String,
    /// Timestamp for when the order record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last status change.
    pub updated_at: NaiveDateTime,
}

impl Order {
    /// Total number of units across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }

    /// Creation time rendered as `January 5, 2025 at 3:07 PM`.
    pub fn formatted_created_at(&self) -> String {
        self.created_at.format("%B %-d, %Y at %-I:%M %p").to_string()
    }
}

/// Payload required to insert a new order.
///
/// There is no status here: new orders are always stored as pending.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer: Customer,
    pub items: Vec<OrderItem>,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub payment_method: String,
}

impl NewOrder {
    /// Assemble an order from the cart contents and the shipping details.
    pub fn from_cart(customer: Customer, cart: &Cart, payment_method: impl Into<String>) -> Self {
        let items = cart
            .items
            .iter()
            .map(|item| OrderItem {
                product_id: item.id,
                name: item.name.clone(),
                price_cents: item.price_cents,
                quantity: item.quantity,
                image: item.primary_image().map(str::to_string),
            })
            .collect();

        Self {
            customer,
            items,
            subtotal_cents: cart.subtotal_cents(),
            total_cents: cart.total_cents(),
            payment_method: payment_method.into(),
        }
    }
}

/// Query definition used to list orders.
#[derive(Debug, Clone, Default)]
pub struct OrderListQuery {
    /// Optional status filter.
    pub status: Option<OrderStatus>,
    /// Optional search term matched against the order id or the customer name.
    pub search: Option<String>,
    /// Optional pagination options applied to the query.
    pub pagination: Option<Pagination>,
}

impl OrderListQuery {
    /// Construct a query that targets every order, newest first.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }

    /// Return only the `limit` most recent orders.
    pub fn recent(self, limit: usize) -> Self {
        self.paginate(1, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn delivered_is_final() {
        for next in OrderStatus::ALL {
            let allowed = OrderStatus::Delivered.can_transition_to(next);
            assert_eq!(allowed, next == OrderStatus::Delivered, "to {next}");
        }
    }

    #[test]
    fn cancelled_can_only_reopen() {
        assert_eq!(
            OrderStatus::Cancelled.allowed_transitions(),
            vec![OrderStatus::Pending]
        );
    }

    #[test]
    fn shipped_cannot_go_back_to_pending() {
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn status_parses_stored_values() {
        assert_eq!(OrderStatus::try_from("Shipped"), Ok(OrderStatus::Shipped));
        assert!(OrderStatus::try_from("lost").is_err());
        assert_eq!(String::from(OrderStatus::Cancelled), "cancelled");
    }

    #[test]
    fn created_at_is_human_readable() {
        let created_at = NaiveDate::from_ymd_opt(2025, 1, 5)
            .and_then(|date| date.and_hms_opt(15, 7, 0))
            .unwrap();
        let order = Order {
            id: 1,
            customer: Customer::default(),
            items: Vec::new(),
            subtotal_cents: 0,
            total_cents: 0,
            status: OrderStatus::Pending,
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            created_at,
            updated_at: created_at,
        };

        assert_eq!(order.formatted_created_at(), "January 5, 2025 at 3:07 PM");
    }

    #[test]
    fn full_name_trims_missing_parts() {
        let customer = Customer {
            first_name: "Ayesha".into(),
            ..Customer::default()
        };
        assert_eq!(customer.full_name(), "Ayesha");
    }
}
