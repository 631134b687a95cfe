use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::routes::{redirect, render_template};
use tera::Tera;

use crate::forms::checkout::{CheckoutForm, FieldErrors};
use crate::repository::DieselRepository;
use crate::routes::{session_cart, storefront_context};
use crate::services::cart::CartView;
use crate::services::checkout::{CheckoutError, OrderConfirmation, place_order};

/// Session key holding the last placed order for the confirmation page.
const CONFIRMATION_KEY: &str = "orderConfirmation";

fn render_checkout(
    tera: &Tera,
    flash_messages: &IncomingFlashMessages,
    cart: &CartView,
    form: &CheckoutForm,
    errors: &FieldErrors,
    error: Option<&str>,
) -> HttpResponse {
    let mut context = storefront_context(flash_messages, cart, "checkout");
    context.insert("cart", cart);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("error", &error);
    render_template(tera, "storefront/checkout.html", &context)
}

#[get("/checkout")]
pub async fn show_checkout(
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let cart = session_cart(session).read();
    if cart.is_empty() {
        FlashMessage::info("Your cart is empty.").send();
        return redirect("/collections");
    }

    render_checkout(
        &tera,
        &flash_messages,
        &CartView::from(&cart),
        &CheckoutForm::default(),
        &FieldErrors::new(),
        None,
    )
}

#[post("/checkout")]
pub async fn submit_checkout(
    session: Session,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
    form: web::Form<CheckoutForm>,
) -> impl Responder {
    let form = form.into_inner();
    let cart = session_cart(session.clone());

    match place_order(repo.get_ref(), &cart, form.clone()) {
        Ok(confirmation) => {
            if let Err(err) = session.insert(CONFIRMATION_KEY, &confirmation) {
                log::error!("Failed to remember order #{}: {err}", confirmation.order_id);
            }
            redirect("/order-confirmation")
        }
        Err(CheckoutError::EmptyCart) => {
            FlashMessage::info("Your cart is empty.").send();
            redirect("/collections")
        }
        Err(CheckoutError::Validation(errors)) => render_checkout(
            &tera,
            &flash_messages,
            &CartView::from(&cart.read()),
            &form,
            &errors,
            None,
        ),
        Err(err @ CheckoutError::Service(_)) => render_checkout(
            &tera,
            &flash_messages,
            &CartView::from(&cart.read()),
            &form,
            &FieldErrors::new(),
            Some(&err.to_string()),
        ),
    }
}

#[get("/order-confirmation")]
pub async fn show_confirmation(
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let confirmation = match session.remove_as::<OrderConfirmation>(CONFIRMATION_KEY) {
        Some(Ok(confirmation)) => confirmation,
        Some(Err(raw)) => {
            log::warn!("Discarding unreadable order confirmation: {raw}");
            return redirect("/");
        }
        None => return redirect("/"),
    };

    let cart = CartView::from(&session_cart(session).read());
    let mut context = storefront_context(&flash_messages, &cart, "checkout");
    context.insert("confirmation", &confirmation);
    render_template(&tera, "storefront/confirmation.html", &context)
}
