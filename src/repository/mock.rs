use mockall::mock;

use super::{
    FeedErrorHandler, OrderFeed, OrderListener, OrderReader, OrderWriter, ProductFeed,
    ProductListener, ProductReader, ProductWriter,
};
use crate::domain::{
    order::{NewOrder, Order, OrderListQuery, OrderStatus},
    product::{NewProduct, Product, ProductListQuery, UpdateProduct},
};
use crate::repository::feed::Subscription;
use pushkind_common::repository::errors::RepositoryResult;

mock! {
    pub ProductReader {}

    impl ProductReader for ProductReader {
        fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>>;
        fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
    }
}

mock! {
    pub ProductWriter {}

    impl ProductWriter for ProductWriter {
        fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
        fn create_products(&self, new_products: &[NewProduct]) -> RepositoryResult<Vec<Product>>;
        fn update_product(&self, product_id: i32, updates: &UpdateProduct) -> RepositoryResult<Product>;
        fn delete_product(&self, product_id: i32) -> RepositoryResult<()>;
    }
}

mock! {
    pub ProductFeed {}

    impl ProductFeed for ProductFeed {
        fn subscribe_products(&self, on_data: ProductListener, on_error: FeedErrorHandler) -> Subscription;
    }
}

mock! {
    pub OrderReader {}

    impl OrderReader for OrderReader {
        fn get_order_by_id(&self, id: i32) -> RepositoryResult<Option<Order>>;
        fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)>;
    }
}

mock! {
    pub OrderWriter {}

    impl OrderWriter for OrderWriter {
        fn create_order(&self, new_order: &NewOrder) -> RepositoryResult<Order>;
        fn update_order_status(&self, order_id: i32, status: OrderStatus) -> RepositoryResult<Order>;
    }
}

mock! {
    pub OrderFeed {}

    impl OrderFeed for OrderFeed {
        fn subscribe_orders(&self, on_data: OrderListener, on_error: FeedErrorHandler) -> Subscription;
    }
}
