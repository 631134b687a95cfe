use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use pushkind_common::routes::check_role;
use serde::{Deserialize, Serialize};

use crate::SERVICE_ACCESS_ROLE;
use crate::domain::format_cents;
use crate::domain::order::{Customer, Order, OrderListQuery, OrderStatus};
use crate::forms::orders::UpdateOrderStatusForm;
use crate::repository::{OrderReader, OrderWriter};
use crate::services::{ServiceError, ServiceResult};

/// Query parameters accepted by the back-office orders page.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    /// Order number or customer name.
    pub search: Option<String>,
    /// Status filter; `all` or absent shows every order.
    pub status: Option<String>,
    pub page: Option<usize>,
}

/// Entry of the status dropdown.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct OrderLineView {
    pub product_id: i32,
    pub name: String,
    pub image: Option<String>,
    pub quantity: i32,
    pub price_formatted: String,
    pub line_total_formatted: String,
}

/// Order as rendered by the back-office and the dashboard.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct OrderView {
    pub id: i32,
    pub customer_name: String,
    pub customer: Customer,
    pub items: Vec<OrderLineView>,
    pub item_count: i64,
    pub subtotal_formatted: String,
    pub total_formatted: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
    /// Current status followed by every status it may move to.
    pub status_options: Vec<StatusOption>,
    pub payment_method: String,
    pub created_at: String,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let created_at = order.formatted_created_at();
        let item_count = order.item_count();
        let status_options = std::iter::once(order.status)
            .chain(order.status.allowed_transitions())
            .map(|status| StatusOption {
                value: status.as_str(),
                label: status.label(),
                selected: status == order.status,
            })
            .collect();

        Self {
            id: order.id,
            customer_name: order.customer.full_name(),
            items: order
                .items
                .iter()
                .map(|item| OrderLineView {
                    product_id: item.product_id,
                    name: item.name.clone(),
                    image: item.image.clone(),
                    quantity: item.quantity,
                    price_formatted: format_cents(item.price_cents),
                    line_total_formatted: format_cents(item.line_total_cents()),
                })
                .collect(),
            customer: order.customer,
            item_count,
            subtotal_formatted: format_cents(order.subtotal_cents),
            total_formatted: format_cents(order.total_cents),
            status: order.status,
            status_label: order.status.label(),
            status_options,
            payment_method: order.payment_method,
            created_at,
        }
    }
}

/// Data required to render the back-office orders template.
pub struct OrdersPageData {
    pub orders: Paginated<OrderView>,
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub statuses: Vec<StatusOption>,
    pub pending_count: usize,
    pub delivered_count: usize,
    pub page: usize,
    pub total_pages: usize,
}

fn count_with_status<R>(repo: &R, status: OrderStatus) -> ServiceResult<usize>
where
    R: OrderReader + ?Sized,
{
    let (total, _) = repo
        .list_orders(OrderListQuery::new().status(status).recent(1))
        .map_err(ServiceError::from)?;
    Ok(total)
}

/// Loads the back-office orders list.
pub fn load_orders_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: OrdersQuery,
) -> ServiceResult<OrdersPageData>
where
    R: OrderReader + ?Sized,
{
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let page = query.page.unwrap_or(1);
    let status = query
        .status
        .as_deref()
        .filter(|value| !value.eq_ignore_ascii_case("all"))
        .and_then(|value| OrderStatus::try_from(value).ok());
    let search = query
        .search
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty());

    let mut list_query = OrderListQuery::new().paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(status) = status {
        list_query = list_query.status(status);
    }

    if let Some(term) = search.as_ref() {
        list_query = list_query.search(term);
    }

    let (total, orders) = repo.list_orders(list_query).map_err(ServiceError::from)?;

    let total_pages = total.div_ceil(DEFAULT_ITEMS_PER_PAGE);
    let orders = Paginated::new(
        orders.into_iter().map(OrderView::from).collect(),
        page,
        total_pages,
    );

    let statuses = OrderStatus::ALL
        .into_iter()
        .map(|option| StatusOption {
            value: option.as_str(),
            label: option.label(),
            selected: Some(option) == status,
        })
        .collect();

    Ok(OrdersPageData {
        orders,
        search,
        status,
        statuses,
        pending_count: count_with_status(repo, OrderStatus::Pending)?,
        delivered_count: count_with_status(repo, OrderStatus::Delivered)?,
        page,
        total_pages,
    })
}

/// Loads one order for the detail view.
pub fn load_order<R>(repo: &R, user: &AuthenticatedUser, order_id: i32) -> ServiceResult<OrderView>
where
    R: OrderReader + ?Sized,
{
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    repo.get_order_by_id(order_id)
        .map_err(ServiceError::from)?
        .map(OrderView::from)
        .ok_or(ServiceError::NotFound)
}

/// Moves an order to the submitted status.
///
/// Delivered orders are final and cancelled orders may only be reopened as
/// pending; other moves are rejected with [`ServiceError::Conflict`].
pub fn update_order_status<R>(
    repo: &R,
    user: &AuthenticatedUser,
    order_id: i32,
    form: UpdateOrderStatusForm,
) -> ServiceResult<Order>
where
    R: OrderReader + OrderWriter + ?Sized,
{
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let next = form
        .into_status()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let order = repo
        .get_order_by_id(order_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    if order.status == next {
        return Ok(order);
    }

    if !order.status.can_transition_to(next) {
        log::warn!(
            "Rejected status change of order #{order_id} from {} to {next}",
            order.status
        );
        return Err(ServiceError::Conflict);
    }

    repo.update_order_status(order_id, next)
        .map_err(ServiceError::from)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pushkind_common::repository::errors::RepositoryResult;

    use crate::domain::order::{NewOrder, OrderItem};
    use crate::repository::mock::{MockOrderReader, MockOrderWriter};
    use crate::services::products::tests::{datetime, user_with_roles};

    pub(crate) fn sample_order(id: i32, first_name: &str, status: OrderStatus) -> Order {
        Order {
            id,
            customer: Customer {
                first_name: first_name.to_string(),
                last_name: "Khan".to_string(),
                address: "12 Mall Road".to_string(),
                city: "Lahore".to_string(),
                phone: "03001234567".to_string(),
                ..Customer::default()
            },
            items: vec![OrderItem {
                product_id: 1,
                name: "Amber".to_string(),
                price_cents: 1000,
                quantity: 2,
                image: None,
            }],
            subtotal_cents: 2000,
            total_cents: 2000,
            status,
            payment_method: "credit_card".to_string(),
            created_at: datetime(),
            updated_at: datetime(),
        }
    }

    struct FakeRepo {
        reader: MockOrderReader,
        writer: MockOrderWriter,
    }

    impl FakeRepo {
        fn with_order(status: OrderStatus) -> Self {
            let mut reader = MockOrderReader::new();
            reader
                .expect_get_order_by_id()
                .returning(move |id| Ok(Some(sample_order(id, "Ayesha", status))));
            Self {
                reader,
                writer: MockOrderWriter::new(),
            }
        }
    }

    impl OrderReader for FakeRepo {
        fn get_order_by_id(&self, id: i32) -> RepositoryResult<Option<Order>> {
            self.reader.get_order_by_id(id)
        }

        fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)> {
            self.reader.list_orders(query)
        }
    }

    impl OrderWriter for FakeRepo {
        fn create_order(&self, new_order: &NewOrder) -> RepositoryResult<Order> {
            self.writer.create_order(new_order)
        }

        fn update_order_status(
            &self,
            order_id: i32,
            status: OrderStatus,
        ) -> RepositoryResult<Order> {
            self.writer.update_order_status(order_id, status)
        }
    }

    fn status_form(status: &str) -> UpdateOrderStatusForm {
        UpdateOrderStatusForm {
            status: status.to_string(),
        }
    }

    #[test]
    fn orders_page_reports_counters() {
        let mut repo = MockOrderReader::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);

        repo.expect_list_orders().times(3).returning(|query| {
            match (query.status, query.search.as_deref()) {
                (Some(OrderStatus::Pending), None) => Ok((4, vec![])),
                (Some(OrderStatus::Delivered), None) => Ok((2, vec![])),
                (Some(OrderStatus::Shipped), Some("ayesha")) => Ok((
                    1,
                    vec![sample_order(3, "Ayesha", OrderStatus::Shipped)],
                )),
                other => panic!("unexpected query {other:?}"),
            }
        });

        let data = load_orders_page(
            &repo,
            &user,
            OrdersQuery {
                search: Some(" ayesha ".to_string()),
                status: Some("shipped".to_string()),
                page: None,
            },
        )
        .unwrap();

        assert_eq!(data.pending_count, 4);
        assert_eq!(data.delivered_count, 2);
        assert_eq!(data.status, Some(OrderStatus::Shipped));
        assert!(data.statuses.iter().any(|option| option.selected && option.value == "shipped"));
    }

    #[test]
    fn orders_page_requires_role() {
        let repo = MockOrderReader::new();
        let user = user_with_roles(&["viewer"]);

        let result = load_orders_page(&repo, &user, OrdersQuery::default());

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn order_view_lists_reachable_statuses() {
        let view = OrderView::from(sample_order(5, "Ayesha", OrderStatus::Shipped));

        let values: Vec<&str> = view.status_options.iter().map(|o| o.value).collect();
        assert_eq!(values, vec!["shipped", "processing", "delivered", "cancelled"]);
        assert_eq!(view.customer_name, "Ayesha Khan");
        assert_eq!(view.total_formatted, "20.00");
        assert_eq!(view.items[0].line_total_formatted, "20.00");
    }

    #[test]
    fn missing_order_is_not_found() {
        let mut repo = MockOrderReader::new();
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);
        repo.expect_get_order_by_id().returning(|_| Ok(None));

        assert!(matches!(
            load_order(&repo, &user, 9),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn allowed_transition_is_written() {
        let mut repo = FakeRepo::with_order(OrderStatus::Pending);
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);

        repo.writer
            .expect_update_order_status()
            .times(1)
            .withf(|id, status| *id == 5 && *status == OrderStatus::Shipped)
            .returning(|id, status| Ok(sample_order(id, "Ayesha", status)));

        let updated = update_order_status(&repo, &user, 5, status_form("shipped")).unwrap();

        assert_eq!(updated.status, OrderStatus::Shipped);
    }

    #[test]
    fn delivered_orders_are_final() {
        let mut repo = FakeRepo::with_order(OrderStatus::Delivered);
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);
        repo.writer.expect_update_order_status().never();

        let result = update_order_status(&repo, &user, 5, status_form("pending"));

        assert!(matches!(result, Err(ServiceError::Conflict)));
    }

    #[test]
    fn cancelled_orders_only_reopen_as_pending() {
        let mut repo = FakeRepo::with_order(OrderStatus::Cancelled);
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);
        repo.writer
            .expect_update_order_status()
            .times(1)
            .withf(|_, status| *status == OrderStatus::Pending)
            .returning(|id, status| Ok(sample_order(id, "Ayesha", status)));

        assert!(matches!(
            update_order_status(&repo, &user, 5, status_form("shipped")),
            Err(ServiceError::Conflict)
        ));
        assert!(update_order_status(&repo, &user, 5, status_form("pending")).is_ok());
    }

    #[test]
    fn same_status_is_a_no_op() {
        let mut repo = FakeRepo::with_order(OrderStatus::Delivered);
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);
        repo.writer.expect_update_order_status().never();

        let order = update_order_status(&repo, &user, 5, status_form("delivered")).unwrap();

        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn unknown_status_is_a_form_error() {
        let repo = FakeRepo::with_order(OrderStatus::Pending);
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);

        assert!(matches!(
            update_order_status(&repo, &user, 5, status_form("lost")),
            Err(ServiceError::Form(_))
        ));
    }
}
