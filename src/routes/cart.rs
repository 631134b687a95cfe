use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, Responder, get, http::header, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::routes::{redirect, render_template};
use tera::Tera;

use crate::domain::cart::MAX_LINE_QUANTITY;
use crate::forms::cart::QuantityForm;
use crate::repository::DieselRepository;
use crate::routes::{session_cart, storefront_context};
use crate::services::ServiceError;
use crate::services::cart::{CartView, add_to_cart};

/// Where to send the visitor after a cart change: back to the page they came
/// from when it is one of ours, otherwise the cart.
fn back_to(req: &HttpRequest) -> String {
    req.headers()
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|referer| {
            let host = req.connection_info().host().to_string();
            referer
                .split_once("://")
                .map(|(_, rest)| rest)
                .and_then(|rest| rest.strip_prefix(host.as_str()))
                .map(str::to_string)
        })
        .filter(|path| path.starts_with('/'))
        .unwrap_or_else(|| "/cart".to_string())
}

#[get("/cart")]
pub async fn show_cart(
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let cart = CartView::from(&session_cart(session).read());

    let mut context = storefront_context(&flash_messages, &cart, "cart");
    context.insert("cart", &cart);
    render_template(&tera, "storefront/cart.html", &context)
}

#[post("/cart/add/{product_id}")]
pub async fn add_cart_item(
    req: HttpRequest,
    path: web::Path<i32>,
    session: Session,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let product_id = path.into_inner();
    let cart = session_cart(session);

    match add_to_cart(repo.get_ref(), &cart, product_id) {
        Ok(updated) => {
            if let Some(item) = updated.get(product_id) {
                FlashMessage::success(format!("{} added to cart.", item.name)).send();
            }
            redirect(&back_to(&req))
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found.").send();
            redirect("/collections")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::warning(message).send();
            redirect(&back_to(&req))
        }
        Err(err) => {
            log::error!("Failed to add product {product_id} to cart: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/cart/remove/{product_id}")]
pub async fn remove_cart_item(path: web::Path<i32>, session: Session) -> impl Responder {
    let cart = session_cart(session);
    cart.remove(path.into_inner());
    redirect("/cart")
}

#[post("/cart/update/{product_id}")]
pub async fn update_cart_item(
    path: web::Path<i32>,
    session: Session,
    form: web::Form<QuantityForm>,
) -> impl Responder {
    let cart = session_cart(session);

    match form.into_inner().into_quantity() {
        Some(quantity) => {
            cart.set_quantity(path.into_inner(), quantity);
        }
        None => {
            FlashMessage::warning(format!(
                "Quantity must be between 1 and {MAX_LINE_QUANTITY}. Use Remove to drop an item."
            ))
            .send();
        }
    }

    redirect("/cart")
}
