use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{base_context, redirect, render_template};
use tera::Tera;

use crate::forms::products::{ProductForm, UploadProductsForm};
use crate::repository::DieselRepository;
use crate::services::{ServiceError, products};

const PRODUCTS_PAGE: &str = "/admin/products";

/// The add/edit dialog repeats the `images` field, which `web::Form` cannot
/// collect, so the body is decoded with `serde_html_form`.
fn parse_product_form(body: &web::Bytes) -> Result<ProductForm, String> {
    serde_html_form::from_bytes::<ProductForm>(body).map_err(|err| err.to_string())
}

#[get("/products")]
pub async fn show_products(
    params: web::Query<products::ProductsQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match products::load_products_page(repo.get_ref(), &user, params.into_inner()) {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                &user,
                "products",
                &server_config.auth_service_url,
            );
            context.insert("products", &data.products);
            context.insert("search", &data.search);
            context.insert("category", &data.category);
            context.insert("categories", &data.categories);
            context.insert("sizes", &data.sizes);
            context.insert("page", &data.page);
            context.insert("total_pages", &data.total_pages);
            render_template(&tera, "admin/products/index.html", &context)
        }
        Err(ServiceError::Unauthorized) => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        Err(err) => {
            log::error!("Failed to list products: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/products/add")]
pub async fn add_product(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    body: web::Bytes,
) -> impl Responder {
    let form = match parse_product_form(&body) {
        Ok(form) => form,
        Err(err) => {
            FlashMessage::error(format!("Invalid product form: {err}")).send();
            return redirect(PRODUCTS_PAGE);
        }
    };

    match products::create_product(repo.get_ref(), &user, form) {
        Ok(product) => {
            FlashMessage::success(format!("Product \"{}\" added.", product.name)).send();
            redirect(PRODUCTS_PAGE)
        }
        Err(ServiceError::Unauthorized) => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(PRODUCTS_PAGE)
        }
        Err(err) => {
            log::error!("Failed to create product: {err}");
            FlashMessage::error("Failed to save product.").send();
            redirect(PRODUCTS_PAGE)
        }
    }
}

#[post("/products/{product_id}/edit")]
pub async fn edit_product(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    body: web::Bytes,
) -> impl Responder {
    let product_id = path.into_inner();
    let form = match parse_product_form(&body) {
        Ok(form) => form,
        Err(err) => {
            FlashMessage::error(format!("Invalid product form: {err}")).send();
            return redirect(PRODUCTS_PAGE);
        }
    };

    match products::update_product(repo.get_ref(), &user, product_id, form) {
        Ok(product) => {
            FlashMessage::success(format!("Product \"{}\" updated.", product.name)).send();
            redirect(PRODUCTS_PAGE)
        }
        Err(ServiceError::Unauthorized) => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(PRODUCTS_PAGE)
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found or already deleted.").send();
            redirect(PRODUCTS_PAGE)
        }
        Err(err) => {
            log::error!("Failed to update product {product_id}: {err}");
            FlashMessage::error("Failed to save product.").send();
            redirect(PRODUCTS_PAGE)
        }
    }
}

#[post("/products/{product_id}/delete")]
pub async fn delete_product(
    path: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let product_id = path.into_inner();

    match products::delete_product(repo.get_ref(), &user, product_id) {
        Ok(()) => {
            FlashMessage::success("Product deleted.").send();
            redirect(PRODUCTS_PAGE)
        }
        Err(ServiceError::Unauthorized) => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found or already deleted.").send();
            redirect(PRODUCTS_PAGE)
        }
        Err(err) => {
            log::error!("Failed to delete product {product_id}: {err}");
            FlashMessage::error("Failed to delete product.").send();
            redirect(PRODUCTS_PAGE)
        }
    }
}

#[post("/products/upload")]
pub async fn upload_products(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    MultipartForm(mut form): MultipartForm<UploadProductsForm>,
) -> impl Responder {
    match products::import_products(repo.get_ref(), &user, &mut form) {
        Ok(count) => {
            FlashMessage::success(format!("{count} products imported.")).send();
            redirect(PRODUCTS_PAGE)
        }
        Err(ServiceError::Unauthorized) => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(PRODUCTS_PAGE)
        }
        Err(err) => {
            log::error!("Failed to import products: {err}");
            FlashMessage::error("Failed to save product.").send();
            redirect(PRODUCTS_PAGE)
        }
    }
}
