use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::routes::{redirect, render_template};
use tera::Tera;

use crate::repository::DieselRepository;
use crate::routes::{session_cart, storefront_context};
use crate::services::ServiceError;
use crate::services::cart::CartView;
use crate::services::storefront::{self, CollectionsQuery};

#[get("/")]
pub async fn show_home(
    session: Session,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let cart = CartView::from(&session_cart(session).read());

    match storefront::load_home(repo.get_ref()) {
        Ok(featured) => {
            let mut context = storefront_context(&flash_messages, &cart, "home");
            context.insert("featured", &featured);
            render_template(&tera, "storefront/index.html", &context)
        }
        Err(err) => {
            log::error!("Failed to load featured products: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/collections")]
pub async fn show_collections(
    params: web::Query<CollectionsQuery>,
    session: Session,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let cart = CartView::from(&session_cart(session).read());

    match storefront::load_collections(repo.get_ref(), params.into_inner()) {
        Ok(data) => {
            let mut context = storefront_context(&flash_messages, &cart, "collections");
            context.insert("products", &data.products);
            context.insert("total", &data.total);
            context.insert("category", &data.category);
            context.insert("categories", &data.categories);
            context.insert("sort", &data.sort);
            context.insert("search", &data.search);
            context.insert("page", &data.page);
            context.insert("total_pages", &data.total_pages);
            render_template(&tera, "storefront/collections.html", &context)
        }
        Err(err) => {
            log::error!("Failed to load collections: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/products/{product_id}")]
pub async fn show_product(
    path: web::Path<i32>,
    session: Session,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let product_id = path.into_inner();
    let cart = session_cart(session).read();
    let in_cart = cart.get(product_id).map(|item| item.quantity).unwrap_or(0);
    let cart = CartView::from(&cart);

    match storefront::load_product(repo.get_ref(), product_id) {
        Ok(product) => {
            let mut context = storefront_context(&flash_messages, &cart, "collections");
            context.insert("product", &product);
            context.insert("in_cart", &in_cart);
            render_template(&tera, "storefront/product.html", &context)
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found.").send();
            redirect("/collections")
        }
        Err(err) => {
            log::error!("Failed to load product {product_id}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
