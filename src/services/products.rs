use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use pushkind_common::routes::check_role;
use serde::{Deserialize, Serialize};

use crate::SERVICE_ACCESS_ROLE;
use crate::domain::format_cents;
use crate::domain::product::{Product, ProductCategory, ProductListQuery, ProductSize};
use crate::forms::products::{ProductForm, UploadProductsForm};
use crate::repository::{ProductReader, ProductWriter};
use crate::services::{ServiceError, ServiceResult};

/// Query parameters accepted by the back-office products page.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    /// Optional search string entered by the user.
    pub search: Option<String>,
    /// Optional category filter; anything unknown shows every category.
    pub category: Option<String>,
    /// Page requested by the UI (1-based).
    pub page: Option<usize>,
}

/// Data required to render the back-office products template.
pub struct ProductsPageData {
    pub products: Paginated<ProductView>,
    pub search: Option<String>,
    pub category: Option<ProductCategory>,
    /// Choices offered by the add/edit dialog.
    pub categories: Vec<&'static str>,
    pub sizes: Vec<&'static str>,
    pub page: usize,
    pub total_pages: usize,
}

/// View model shared by the storefront and back-office product templates.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub category: &'static str,
    pub price_cents: i64,
    pub price_formatted: String,
    pub size: &'static str,
    pub images: Vec<String>,
    pub primary_image: Option<String>,
    pub description: String,
    pub stock: i32,
    pub in_stock: bool,
    pub created_at: chrono::NaiveDateTime,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let primary_image = product.primary_image().map(str::to_string);
        Self {
            id: product.id,
            name: product.name,
            category: product.category.as_str(),
            price_cents: product.price_cents,
            price_formatted: format_cents(product.price_cents),
            size: product.size.as_str(),
            images: product.images,
            primary_image,
            description: product.description,
            stock: product.stock,
            in_stock: product.stock > 0,
            created_at: product.created_at,
        }
    }
}

/// Category names in display order.
pub fn category_choices() -> Vec<&'static str> {
    ProductCategory::ALL
        .iter()
        .map(ProductCategory::as_str)
        .collect()
}

/// Bottle sizes in display order.
pub fn size_choices() -> Vec<&'static str> {
    ProductSize::ALL.iter().map(ProductSize::as_str).collect()
}

fn ensure_admin(user: &AuthenticatedUser) -> ServiceResult<()> {
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }
    Ok(())
}

/// Loads the back-office products page.
pub fn load_products_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: ProductsQuery,
) -> ServiceResult<ProductsPageData>
where
    R: ProductReader + ?Sized,
{
    ensure_admin(user)?;

    let ProductsQuery {
        search,
        category,
        page,
    } = query;

    let page = page.unwrap_or(1);
    let category = category
        .as_deref()
        .and_then(|value| ProductCategory::try_from(value).ok());

    let mut list_query = ProductListQuery::new().paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(search_term) = search.as_ref() {
        list_query = list_query.search(search_term);
    }

    if let Some(category) = category {
        list_query = list_query.category(category);
    }

    let (total, items) = repo.list_products(list_query).map_err(ServiceError::from)?;

    let total_pages = total.div_ceil(DEFAULT_ITEMS_PER_PAGE);
    let products = Paginated::new(
        items.into_iter().map(ProductView::from).collect(),
        page,
        total_pages,
    );

    Ok(ProductsPageData {
        products,
        search,
        category,
        categories: category_choices(),
        sizes: size_choices(),
        page,
        total_pages,
    })
}

/// Creates a new product from the add dialog.
pub fn create_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: ProductForm,
) -> ServiceResult<Product>
where
    R: ProductWriter + ?Sized,
{
    ensure_admin(user)?;

    let new_product = form
        .into_new_product()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    repo.create_product(&new_product)
        .map_err(ServiceError::from)
}

/// Applies the edit dialog to an existing product.
pub fn update_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    product_id: i32,
    form: ProductForm,
) -> ServiceResult<Product>
where
    R: ProductReader + ProductWriter + ?Sized,
{
    ensure_admin(user)?;

    let updates = form
        .into_update_product()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    if repo
        .get_product_by_id(product_id)
        .map_err(ServiceError::from)?
        .is_none()
    {
        return Err(ServiceError::NotFound);
    }

    repo.update_product(product_id, &updates)
        .map_err(ServiceError::from)
}

/// Removes a product from the catalogue.
pub fn delete_product<R>(repo: &R, user: &AuthenticatedUser, product_id: i32) -> ServiceResult<()>
where
    R: ProductWriter + ?Sized,
{
    ensure_admin(user)?;

    repo.delete_product(product_id).map_err(ServiceError::from)
}

/// Creates every product listed in an uploaded CSV file.
///
/// The whole file is validated first and then stored in one transaction, so
/// either every row is imported or none is.
pub fn import_products<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: &mut UploadProductsForm,
) -> ServiceResult<usize>
where
    R: ProductWriter + ?Sized,
{
    ensure_admin(user)?;

    let uploads = form
        .into_new_products()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let created = repo.create_products(&uploads).map_err(|err| {
        log::error!("Product import of {} rows rolled back: {err}", uploads.len());
        ServiceError::from(err)
    })?;

    Ok(created.len())
}
