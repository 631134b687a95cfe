use actix_web::{HttpResponse, Responder, get, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{base_context, redirect, render_template};
use tera::Tera;

use crate::services::ServiceError;
use crate::services::dashboard::{LiveCatalog, load_dashboard};

#[get("")]
pub async fn show_dashboard(
    user: AuthenticatedUser,
    live: web::Data<LiveCatalog>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let now = chrono::Utc::now().naive_utc();

    match load_dashboard(live.get_ref(), &user, now) {
        Ok(data) => {
            let mut context = base_context(
                &flash_messages,
                &user,
                "dashboard",
                &server_config.auth_service_url,
            );
            context.insert("stats", &data.stats);
            context.insert("top_products", &data.top_products);
            context.insert("recent_orders", &data.recent_orders);
            context.insert("inventory", &data.inventory);
            context.insert("load_errors", &data.load_errors);
            render_template(&tera, "admin/dashboard/index.html", &context)
        }
        Err(ServiceError::Unauthorized) => {
            FlashMessage::error("Insufficient permissions.").send();
            redirect("/na")
        }
        Err(err) => {
            log::error!("Failed to build dashboard: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
