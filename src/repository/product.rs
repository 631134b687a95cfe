use diesel::prelude::*;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::product::{
        NewProduct as DomainNewProduct, Product as DomainProduct, ProductListQuery, ProductSort,
        UpdateProduct as DomainUpdateProduct,
    },
    models::product::{
        NewProduct as DbNewProduct, Product as DbProduct, UpdateProduct as DbUpdateProduct,
    },
    repository::{
        DieselRepository, FeedErrorHandler, ProductFeed, ProductListener, ProductReader,
        ProductWriter, feed::Subscription, page_bounds, subscribe_with_snapshot,
    },
};

impl DieselRepository {
    /// Push the current catalogue to subscribers after a write.
    fn publish_products(&self) {
        let reloaded = self
            .products_feed
            .refresh(|| self.list_products(ProductListQuery::new()).map(|(_, products)| products));

        if let Err(err) = reloaded {
            log::error!("Failed to reload products for subscribers: {err}");
        }
    }
}

impl ProductReader for DieselRepository {
    fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let product = products::table
            .filter(products::id.eq(id))
            .first::<DbProduct>(&mut conn)
            .optional()?;

        Ok(product.map(Into::into))
    }

    fn list_products(
        &self,
        query: ProductListQuery,
    ) -> RepositoryResult<(usize, Vec<DomainProduct>)> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let ProductListQuery {
            category,
            search,
            sort,
            pagination,
        } = query;

        let search_pattern = search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| format!("%{term}%"));

        let mut count_query = products::table.into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(category) = category {
            count_query = count_query.filter(products::category.eq(category.as_str()));
        }

        if let Some(ref pattern) = search_pattern {
            count_query = count_query.filter(
                products::name
                    .like(pattern.clone())
                    .or(products::description.like(pattern.clone())),
            );
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = products::table.into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(category) = category {
            items = items.filter(products::category.eq(category.as_str()));
        }

        if let Some(ref pattern) = search_pattern {
            items = items.filter(
                products::name
                    .like(pattern.clone())
                    .or(products::description.like(pattern.clone())),
            );
        }

        items = match sort {
            ProductSort::Featured => items.order((products::created_at.asc(), products::id.asc())),
            ProductSort::Newest => items.order((products::created_at.desc(), products::id.desc())),
            ProductSort::PriceLow => items.order((products::price_cents.asc(), products::id.asc())),
            ProductSort::PriceHigh => {
                items.order((products::price_cents.desc(), products::id.asc()))
            }
        };

        if let Some(pagination) = &pagination {
            let (offset, limit) = page_bounds(pagination);
            items = items.offset(offset).limit(limit);
        }

        let db_products = items.load::<DbProduct>(&mut conn)?;

        Ok((total, db_products.into_iter().map(Into::into).collect()))
    }
}

impl ProductWriter for DieselRepository {
    fn create_product(&self, new_product: &DomainNewProduct) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_new = DbNewProduct::from(new_product);

        let created = diesel::insert_into(products::table)
            .values(&db_new)
            .get_result::<DbProduct>(&mut conn)?;
        drop(conn);

        self.publish_products();
        Ok(created.into())
    }

    fn create_products(
        &self,
        new_products: &[DomainNewProduct],
    ) -> RepositoryResult<Vec<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let created = conn.transaction::<Vec<DbProduct>, RepositoryError, _>(|conn| {
            let mut created = Vec::with_capacity(new_products.len());
            for new_product in new_products {
                let db_new = DbNewProduct::from(new_product);
                created.push(
                    diesel::insert_into(products::table)
                        .values(&db_new)
                        .get_result::<DbProduct>(conn)?,
                );
            }
            Ok(created)
        })?;
        drop(conn);

        self.publish_products();
        Ok(created.into_iter().map(Into::into).collect())
    }

    fn update_product(
        &self,
        product_id: i32,
        updates: &DomainUpdateProduct,
    ) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_updates = DbUpdateProduct::from(updates);

        let updated = diesel::update(products::table.filter(products::id.eq(product_id)))
            .set(&db_updates)
            .get_result::<DbProduct>(&mut conn)?;
        drop(conn);

        self.publish_products();
        Ok(updated.into())
    }

    fn delete_product(&self, product_id: i32) -> RepositoryResult<()> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let deleted = diesel::delete(products::table.filter(products::id.eq(product_id)))
            .execute(&mut conn)?;
        drop(conn);

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.publish_products();
        Ok(())
    }
}

impl ProductFeed for DieselRepository {
    fn subscribe_products(
        &self,
        on_data: ProductListener,
        on_error: FeedErrorHandler,
    ) -> Subscription {
        subscribe_with_snapshot(
            &self.products_feed,
            || {
                self.list_products(ProductListQuery::new())
                    .map(|(_, products)| products)
            },
            on_data,
            on_error,
        )
    }
}
