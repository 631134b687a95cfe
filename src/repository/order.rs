use std::collections::HashMap;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::order::{NewOrder as DomainNewOrder, Order as DomainOrder, OrderListQuery, OrderStatus},
    models::order::{
        NewOrder as DbNewOrder, NewOrderItem as DbNewOrderItem, Order as DbOrder,
        OrderItem as DbOrderItem, UpdateOrderStatus as DbUpdateOrderStatus,
    },
    repository::{
        DieselRepository, FeedErrorHandler, OrderFeed, OrderListener, OrderReader, OrderWriter,
        feed::Subscription, page_bounds, subscribe_with_snapshot,
    },
};

impl DieselRepository {
    /// Push every order, newest first, to subscribers after a write.
    fn publish_orders(&self) {
        let reloaded = self
            .orders_feed
            .refresh(|| self.list_orders(OrderListQuery::new()).map(|(_, orders)| orders));

        if let Err(err) = reloaded {
            log::error!("Failed to reload orders for subscribers: {err}");
        }
    }
}

fn load_order_items(
    conn: &mut SqliteConnection,
    order_ids: &[i32],
) -> RepositoryResult<HashMap<i32, Vec<DbOrderItem>>> {
    use crate::schema::order_items;

    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = order_items::table
        .filter(order_items::order_id.eq_any(order_ids))
        .order(order_items::id.asc())
        .load::<DbOrderItem>(conn)?;

    let mut items_by_order: HashMap<i32, Vec<DbOrderItem>> = HashMap::new();
    for row in rows {
        items_by_order.entry(row.order_id).or_default().push(row);
    }

    Ok(items_by_order)
}

impl OrderReader for DieselRepository {
    fn get_order_by_id(&self, id: i32) -> RepositoryResult<Option<DomainOrder>> {
        use crate::schema::orders;

        let mut conn = self.conn()?;
        let order = orders::table
            .filter(orders::id.eq(id))
            .first::<DbOrder>(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let items = load_order_items(&mut conn, &[order.id])?
            .remove(&order.id)
            .unwrap_or_default();

        Ok(Some(DomainOrder::from((order, items))))
    }

    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<DomainOrder>)> {
        use crate::schema::orders;

        let mut conn = self.conn()?;

        let OrderListQuery {
            status,
            search,
            pagination,
        } = query;

        let search_term = search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());
        let search_pattern = search_term.map(|term| format!("%{term}%"));
        let search_id = search_term
            .map(|term| term.trim_start_matches('#'))
            .and_then(|term| term.parse::<i32>().ok());

        let mut count_query = orders::table.into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(status) = status {
            count_query = count_query.filter(orders::status.eq(status.as_str()));
        }

        if let Some(ref pattern) = search_pattern {
            let name_matches = orders::first_name
                .concat(" ")
                .concat(orders::last_name)
                .like(pattern.clone());
            count_query = match search_id {
                Some(id) => count_query.filter(name_matches.or(orders::id.eq(id))),
                None => count_query.filter(name_matches),
            };
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = orders::table.into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(status) = status {
            items = items.filter(orders::status.eq(status.as_str()));
        }

        if let Some(ref pattern) = search_pattern {
            let name_matches = orders::first_name
                .concat(" ")
                .concat(orders::last_name)
                .like(pattern.clone());
            items = match search_id {
                Some(id) => items.filter(name_matches.or(orders::id.eq(id))),
                None => items.filter(name_matches),
            };
        }

        items = items.order((orders::created_at.desc(), orders::id.desc()));

        if let Some(pagination) = &pagination {
            let (offset, limit) = page_bounds(pagination);
            items = items.offset(offset).limit(limit);
        }

        let db_orders = items.load::<DbOrder>(&mut conn)?;
        if db_orders.is_empty() {
            return Ok((total, Vec::new()));
        }

        let order_ids: Vec<i32> = db_orders.iter().map(|order| order.id).collect();
        let mut items_by_order = load_order_items(&mut conn, &order_ids)?;

        let orders = db_orders
            .into_iter()
            .map(|order| {
                let order_items = items_by_order.remove(&order.id).unwrap_or_default();
                DomainOrder::from((order, order_items))
            })
            .collect();

        Ok((total, orders))
    }
}

impl OrderWriter for DieselRepository {
    fn create_order(&self, new_order: &DomainNewOrder) -> RepositoryResult<DomainOrder> {
        use crate::schema::{order_items, orders};

        let mut conn = self.conn()?;

        let created = conn.transaction::<DomainOrder, RepositoryError, _>(|conn| {
            let db_new = DbNewOrder::from(new_order);

            let created = diesel::insert_into(orders::table)
                .values(&db_new)
                .get_result::<DbOrder>(conn)?;

            let order_id = created.id;

            if !new_order.items.is_empty() {
                let payload: Vec<DbNewOrderItem> = new_order
                    .items
                    .iter()
                    .map(|item| DbNewOrderItem::from_domain(order_id, item))
                    .collect();

                diesel::insert_into(order_items::table)
                    .values(&payload)
                    .execute(conn)?;
            }

            let items = load_order_items(conn, &[order_id])?
                .remove(&order_id)
                .unwrap_or_default();

            Ok(DomainOrder::from((created, items)))
        })?;
        drop(conn);

        self.publish_orders();
        Ok(created)
    }

    fn update_order_status(
        &self,
        order_id: i32,
        status: OrderStatus,
    ) -> RepositoryResult<DomainOrder> {
        use crate::schema::orders;

        let mut conn = self.conn()?;

        let db_updates = DbUpdateOrderStatus {
            status: status.as_str(),
            updated_at: chrono::Local::now().naive_utc(),
        };

        let updated = diesel::update(orders::table.filter(orders::id.eq(order_id)))
            .set(&db_updates)
            .get_result::<DbOrder>(&mut conn)?;

        let items = load_order_items(&mut conn, &[order_id])?
            .remove(&order_id)
            .unwrap_or_default();
        drop(conn);

        self.publish_orders();
        Ok(DomainOrder::from((updated, items)))
    }
}

impl OrderFeed for DieselRepository {
    fn subscribe_orders(
        &self,
        on_data: OrderListener,
        on_error: FeedErrorHandler,
    ) -> Subscription {
        subscribe_with_snapshot(
            &self.orders_feed,
            || self.list_orders(OrderListQuery::new()).map(|(_, orders)| orders),
            on_data,
            on_error,
        )
    }
}
