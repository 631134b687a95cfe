use actix_session::Session;
use actix_web_flash_messages::{IncomingFlashMessages, Level};
use serde::Serialize;
use tera::Context;

use crate::cart::{CartStore, SessionCartStorage};
use crate::services::cart::CartView;

pub mod api;
pub mod cart;
pub mod checkout;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod storefront;

#[derive(Serialize)]
struct Alert {
    level: &'static str,
    message: String,
}

/// Cart bound to the visitor's cookie session.
pub(crate) fn session_cart(session: Session) -> CartStore<SessionCartStorage> {
    CartStore::new(SessionCartStorage::new(session))
}

/// Context shared by every storefront page: flash alerts, the active menu
/// entry and the cart badge.
pub(crate) fn storefront_context(
    flash_messages: &IncomingFlashMessages,
    cart: &CartView,
    current_page: &str,
) -> Context {
    let alerts: Vec<Alert> = flash_messages
        .iter()
        .map(|message| Alert {
            level: match message.level() {
                Level::Error => "danger",
                Level::Warning => "warning",
                Level::Success => "success",
                Level::Info | Level::Debug => "info",
            },
            message: message.content().to_string(),
        })
        .collect();

    let mut context = Context::new();
    context.insert("alerts", &alerts);
    context.insert("current_page", current_page);
    context.insert("cart_count", &cart.item_count);
    context
}
