use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::order::{
    Customer as DomainCustomer, NewOrder as DomainNewOrder, Order as DomainOrder,
    OrderItem as DomainOrderItem, OrderStatus,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::orders)]
pub struct Order {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub apartment: Option<String>,
    pub city: String,
    pub phone: String,
    pub email: Option<String>,
    pub save_info: bool,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub status: String,
    pub payment_method: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::order_items)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i32,
    pub image: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub address: &'a str,
    pub apartment: Option<&'a str>,
    pub city: &'a str,
    pub phone: &'a str,
    pub email: Option<&'a str>,
    pub save_info: bool,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub status: &'a str,
    pub payment_method: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::order_items)]
pub struct NewOrderItem<'a> {
    pub order_id: i32,
    pub product_id: i32,
    pub name: &'a str,
    pub price_cents: i64,
    pub quantity: i32,
    pub image: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::orders)]
pub struct UpdateOrderStatus<'a> {
    pub status: &'a str,
    pub updated_at: NaiveDateTime,
}

impl Order {
    pub fn into_domain(self, items: Vec<OrderItem>) -> DomainOrder {
        let status = OrderStatus::try_from(self.status.as_str()).unwrap_or_else(|err| {
            log::warn!("Order {}: {err}", self.id);
            OrderStatus::Pending
        });

        DomainOrder {
            id: self.id,
            customer: DomainCustomer {
                first_name: self.first_name,
                last_name: self.last_name,
                address: self.address,
                apartment: self.apartment,
                city: self.city,
                phone: self.phone,
                email: self.email,
                save_info: self.save_info,
            },
            items: items.into_iter().map(OrderItem::into_domain).collect(),
            subtotal_cents: self.subtotal_cents,
            total_cents: self.total_cents,
            status,
            payment_method: self.payment_method,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl OrderItem {
    pub fn into_domain(self) -> DomainOrderItem {
        DomainOrderItem {
            product_id: self.product_id,
            name: self.name,
            price_cents: self.price_cents,
            quantity: self.quantity,
            image: self.image,
        }
    }
}

impl From<(Order, Vec<OrderItem>)> for DomainOrder {
    fn from(value: (Order, Vec<OrderItem>)) -> Self {
        value.0.into_domain(value.1)
    }
}

impl<'a> From<&'a DomainNewOrder> for NewOrder<'a> {
    fn from(value: &'a DomainNewOrder) -> Self {
        let customer = &value.customer;
        Self {
            first_name: customer.first_name.as_str(),
            last_name: customer.last_name.as_str(),
            address: customer.address.as_str(),
            apartment: customer.apartment.as_deref(),
            city: customer.city.as_str(),
            phone: customer.phone.as_str(),
            email: customer.email.as_deref(),
            save_info: customer.save_info,
            subtotal_cents: value.subtotal_cents,
            total_cents: value.total_cents,
            status: OrderStatus::Pending.as_str(),
            payment_method: value.payment_method.as_str(),
        }
    }
}

impl<'a> NewOrderItem<'a> {
    pub fn from_domain(order_id: i32, value: &'a DomainOrderItem) -> Self {
        Self {
            order_id,
            product_id: value.product_id,
            name: value.name.as_str(),
            price_cents: value.price_cents,
            quantity: value.quantity,
            image: value.image.as_deref(),
        }
    }
}
