use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, web};
use pushkind_common::pagination::Paginated;
use serde::Serialize;

use crate::repository::DieselRepository;
use crate::routes::session_cart;
use crate::services::cart::CartView;
use crate::services::products::ProductView;
use crate::services::storefront::{self, CollectionsQuery};

#[derive(Serialize)]
struct ProductsResponse {
    products: Paginated<ProductView>,
    total: usize,
    per_page: usize,
}

#[get("/v1/products")]
/// Return one page of the public catalogue as JSON, with the same filters as
/// `/collections`.
pub async fn api_v1_products(
    params: web::Query<CollectionsQuery>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match storefront::load_collections(repo.get_ref(), params.into_inner()) {
        Ok(data) => HttpResponse::Ok().json(ProductsResponse {
            products: data.products,
            total: data.total,
            per_page: storefront::PRODUCTS_PER_PAGE,
        }),
        Err(err) => {
            log::error!("Failed to list products: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/v1/cart")]
/// Return the visitor's cart with its totals.
pub async fn api_v1_cart(session: Session) -> impl Responder {
    let cart = session_cart(session).read();
    HttpResponse::Ok().json(CartView::from(&cart))
}
