use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::{CartStorage, CartStore};
use crate::domain::order::{DEFAULT_PAYMENT_METHOD, NewOrder};
use crate::domain::format_cents;
use crate::forms::checkout::{CheckoutForm, FieldErrors};
use crate::repository::OrderWriter;
use crate::services::ServiceError;

/// Shown when the store rejects an otherwise valid order.
pub const PLACE_ORDER_FAILED: &str = "Failed to place order. Please try again.";

/// Reasons a checkout attempt does not produce an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,
    /// One message per invalid shipping field.
    #[error("please correct the highlighted fields")]
    Validation(FieldErrors),
    #[error("{PLACE_ORDER_FAILED}")]
    Service(#[from] ServiceError),
}

/// Summary kept in the session for the confirmation page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: i32,
    pub customer_name: String,
    pub email: Option<String>,
    pub item_count: i64,
    pub total_cents: i64,
    pub total_formatted: String,
}

/// Turns the current cart and the shipping form into a pending order.
///
/// The order is created once. The cart is emptied only after the store
/// accepted the order; on any failure it is left untouched.
pub fn place_order<R, S>(
    repo: &R,
    cart: &CartStore<S>,
    form: CheckoutForm,
) -> Result<OrderConfirmation, CheckoutError>
where
    R: OrderWriter + ?Sized,
    S: CartStorage,
{
    let current = cart.read();
    if current.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let customer = form.into_customer().map_err(CheckoutError::Validation)?;
    let new_order = NewOrder::from_cart(customer, &current, DEFAULT_PAYMENT_METHOD);

    let order = repo.create_order(&new_order).map_err(|err| {
        log::error!("Failed to place order: {err}");
        CheckoutError::Service(ServiceError::from(err))
    })?;

    cart.clear();
    log::info!(
        "Order #{} placed for {} ({} items)",
        order.id,
        order.customer.full_name(),
        order.item_count()
    );

    Ok(OrderConfirmation {
        order_id: order.id,
        customer_name: order.customer.full_name(),
        email: order.customer.email.clone(),
        item_count: order.item_count(),
        total_cents: order.total_cents,
        total_formatted: format_cents(order.total_cents),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use pushkind_common::repository::errors::RepositoryError;

    use crate::cart::MemoryCartStorage;
    use crate::domain::order::{Order, OrderStatus};
    use crate::repository::mock::MockOrderWriter;
    use crate::services::products::tests::{datetime, sample_product};

    fn form() -> CheckoutForm {
        CheckoutForm {
            first_name: "Ayesha".to_string(),
            last_name: "Khan".to_string(),
            address: "12 Mall Road".to_string(),
            apartment: None,
            city: "Lahore".to_string(),
            phone: "03001234567".to_string(),
            email: Some("ayesha@example.com".to_string()),
            save_info: None,
        }
    }

    fn order_from(new_order: &NewOrder, created_at: NaiveDateTime) -> Order {
        Order {
            id: 17,
            customer: new_order.customer.clone(),
            items: new_order.items.clone(),
            subtotal_cents: new_order.subtotal_cents,
            total_cents: new_order.total_cents,
            status: OrderStatus::Pending,
            payment_method: new_order.payment_method.clone(),
            created_at,
            updated_at: created_at,
        }
    }

    fn filled_cart() -> (MemoryCartStorage, CartStore<MemoryCartStorage>) {
        let storage = MemoryCartStorage::new();
        let store = CartStore::new(storage.clone());
        let product = sample_product(1, "Amber", 1000);
        store.add(&product);
        store.add(&product);
        store.add(&sample_product(2, "Iris", 1500));
        (storage, store)
    }

    #[test]
    fn blank_first_name_never_reaches_the_store() {
        let mut repo = MockOrderWriter::new();
        repo.expect_create_order().never();
        let (storage, store) = filled_cart();

        let result = place_order(
            &repo,
            &store,
            CheckoutForm {
                first_name: String::new(),
                ..form()
            },
        );

        match result {
            Err(CheckoutError::Validation(errors)) => {
                assert!(errors.contains_key("first_name"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(storage.raw().is_some());
        assert_eq!(store.read().item_count(), 3);
    }

    #[test]
    fn valid_checkout_creates_one_pending_order_then_clears_cart() {
        let mut repo = MockOrderWriter::new();
        let (storage, store) = filled_cart();
        let observed = storage.clone();

        repo.expect_create_order()
            .times(1)
            .withf(|order| {
                order.payment_method == DEFAULT_PAYMENT_METHOD
                    && order.subtotal_cents == 3500
                    && order.total_cents == 3500
                    && order.items.len() == 2
            })
            .returning(move |new_order| {
                // The cart is still intact while the store is working.
                assert!(observed.raw().is_some_and(|raw| raw != "[]"));
                Ok(order_from(new_order, datetime()))
            });

        let confirmation = place_order(&repo, &store, form()).unwrap();

        assert_eq!(confirmation.order_id, 17);
        assert_eq!(confirmation.customer_name, "Ayesha Khan");
        assert_eq!(confirmation.total_formatted, "35.00");
        assert_eq!(confirmation.item_count, 3);
        assert!(store.read().is_empty());
    }

    #[test]
    fn failed_create_keeps_the_cart() {
        let mut repo = MockOrderWriter::new();
        repo.expect_create_order()
            .times(1)
            .returning(|_| Err(RepositoryError::NotFound));
        let (_storage, store) = filled_cart();

        let result = place_order(&repo, &store, form());

        match result {
            Err(err @ CheckoutError::Service(_)) => {
                assert_eq!(err.to_string(), PLACE_ORDER_FAILED);
            }
            other => panic!("expected service error, got {other:?}"),
        }
        assert_eq!(store.read().item_count(), 3);
    }

    #[test]
    fn empty_cart_is_rejected() {
        let mut repo = MockOrderWriter::new();
        repo.expect_create_order().never();
        let store = CartStore::new(MemoryCartStorage::new());

        assert!(matches!(
            place_order(&repo, &store, form()),
            Err(CheckoutError::EmptyCart)
        ));
    }
}
