use pushkind_common::pagination::Paginated;
use serde::Deserialize;

use crate::domain::product::{ProductCategory, ProductListQuery, ProductSort};
use crate::repository::ProductReader;
use crate::services::products::{ProductView, category_choices};
use crate::services::{ServiceError, ServiceResult};

/// Products shown per collections page.
pub const PRODUCTS_PER_PAGE: usize = 8;
/// Products shown in the home page showcase.
pub const FEATURED_PRODUCTS: usize = 4;

/// Query string of `/collections`.
#[derive(Debug, Default, Deserialize)]
pub struct CollectionsQuery {
    /// Category display name, `all` or absent for every category.
    pub category: Option<String>,
    /// One of `featured`, `newest`, `price-low` or `price-high`.
    pub sort: Option<String>,
    pub search: Option<String>,
    pub page: Option<usize>,
}

/// Data required to render the collections template.
pub struct CollectionsPageData {
    pub products: Paginated<ProductView>,
    pub category: Option<ProductCategory>,
    pub sort: ProductSort,
    pub search: Option<String>,
    pub categories: Vec<&'static str>,
    /// Number of products matching the filters across every page.
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

fn parse_sort(value: Option<&str>) -> ProductSort {
    match value.map(str::trim) {
        Some("newest") => ProductSort::Newest,
        Some("price-low") => ProductSort::PriceLow,
        Some("price-high") => ProductSort::PriceHigh,
        _ => ProductSort::Featured,
    }
}

/// Loads the newest products for the home page.
pub fn load_home<R>(repo: &R) -> ServiceResult<Vec<ProductView>>
where
    R: ProductReader + ?Sized,
{
    let query = ProductListQuery::new()
        .sort(ProductSort::Newest)
        .paginate(1, FEATURED_PRODUCTS);

    let (_total, products) = repo.list_products(query).map_err(ServiceError::from)?;

    Ok(products.into_iter().map(ProductView::from).collect())
}

/// Loads one page of the product catalogue.
///
/// Unknown categories and sort keys fall back to every category and the
/// featured order.
pub fn load_collections<R>(repo: &R, query: CollectionsQuery) -> ServiceResult<CollectionsPageData>
where
    R: ProductReader + ?Sized,
{
    let CollectionsQuery {
        category,
        sort,
        search,
        page,
    } = query;

    let page = page.unwrap_or(1).max(1);
    let sort = parse_sort(sort.as_deref());
    let category = category
        .as_deref()
        .filter(|value| !value.eq_ignore_ascii_case("all"))
        .and_then(|value| ProductCategory::try_from(value).ok());
    let search = search
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty());

    let mut list_query = ProductListQuery::new()
        .sort(sort)
        .paginate(page, PRODUCTS_PER_PAGE);

    if let Some(category) = category {
        list_query = list_query.category(category);
    }

    if let Some(term) = search.as_ref() {
        list_query = list_query.search(term);
    }

    let (total, items) = repo.list_products(list_query).map_err(ServiceError::from)?;

    let total_pages = total.div_ceil(PRODUCTS_PER_PAGE);
    let products = Paginated::new(
        items.into_iter().map(ProductView::from).collect(),
        page,
        total_pages,
    );

    Ok(CollectionsPageData {
        products,
        category,
        sort,
        search,
        categories: category_choices(),
        total,
        page,
        total_pages,
    })
}

/// Loads a single product for its detail page.
pub fn load_product<R>(repo: &R, product_id: i32) -> ServiceResult<ProductView>
where
    R: ProductReader + ?Sized,
{
    match repo.get_product_by_id(product_id) {
        Ok(Some(product)) => Ok(ProductView::from(product)),
        Ok(None) => Err(ServiceError::NotFound),
        Err(err) => {
            log::error!("Failed to load product {product_id}: {err}");
            Err(ServiceError::from(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::mock::MockProductReader;
    use crate::services::products::tests::sample_product;

    #[test]
    fn collections_apply_category_sort_and_page_size() {
        let mut repo = MockProductReader::new();

        repo.expect_list_products()
            .times(1)
            .withf(|query| {
                query.category == Some(ProductCategory::EauDeToilette)
                    && query.sort == ProductSort::PriceLow
                    && query
                        .pagination
                        .as_ref()
                        .is_some_and(|p| p.page == 2 && p.per_page == PRODUCTS_PER_PAGE)
            })
            .returning(|_| Ok((9, vec![sample_product(9, "Vetiver", 4500)])));

        let data = load_collections(
            &repo,
            CollectionsQuery {
                category: Some("Eau de Toilette".to_string()),
                sort: Some("price-low".to_string()),
                search: None,
                page: Some(2),
            },
        )
        .unwrap();

        assert_eq!(data.total, 9);
        assert_eq!(data.sort, ProductSort::PriceLow);
    }

    #[test]
    fn collections_ignore_unknown_filters() {
        let mut repo = MockProductReader::new();

        repo.expect_list_products()
            .withf(|query| query.category.is_none() && query.sort == ProductSort::Featured)
            .returning(|_| Ok((0, vec![])));

        let data = load_collections(
            &repo,
            CollectionsQuery {
                category: Some("all".to_string()),
                sort: Some("random".to_string()),
                search: Some("   ".to_string()),
                page: Some(0),
            },
        )
        .unwrap();

        assert_eq!(data.category, None);
        assert_eq!(data.search, None);
    }

    #[test]
    fn home_shows_newest_products() {
        let mut repo = MockProductReader::new();

        repo.expect_list_products()
            .withf(|query| {
                query.sort == ProductSort::Newest
                    && query
                        .pagination
                        .as_ref()
                        .is_some_and(|p| p.per_page == FEATURED_PRODUCTS)
            })
            .returning(|_| Ok((1, vec![sample_product(1, "Amber", 3000)])));

        let products = load_home(&repo).unwrap();

        assert_eq!(products.len(), 1);
    }

    #[test]
    fn missing_product_is_not_found() {
        let mut repo = MockProductReader::new();
        repo.expect_get_product_by_id().returning(|_| Ok(None));

        assert!(matches!(load_product(&repo, 42), Err(ServiceError::NotFound)));
    }
}
